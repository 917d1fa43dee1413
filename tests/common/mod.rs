//! Shared fixtures for integration tests

use preference_system::config::Config;
use preference_system::context::PreferenceContext;
use preference_system::logging;
use tempfile::TempDir;

/// Isolated context rooted in a temporary data directory
pub struct TestEnv {
    pub dir: TempDir,
    pub ctx: PreferenceContext,
}

impl TestEnv {
    pub fn new() -> Self {
        logging::init_test_logging();
        let dir = tempfile::tempdir().expect("create temp dir");
        let ctx = PreferenceContext::new(Config::with_data_dir(dir.path()));
        Self { dir, ctx }
    }

    /// A second context over the same directory, as after a restart
    #[allow(dead_code)]
    pub fn restart(&self) -> PreferenceContext {
        PreferenceContext::new(Config::with_data_dir(self.dir.path()))
    }
}
