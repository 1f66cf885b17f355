mod mock_rng;

pub use mock_rng::MockRng;
