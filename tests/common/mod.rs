//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_millis(500)
}

/// Let spawned tasks run until they block again
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
