// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod faker;
mod memory;

pub use faker::*;
pub use memory::*;

use std::sync::Arc;
use std::time::Duration;

/// A shared in-memory API seeded with a small, deterministic office.
pub fn demo_api(seed: u64, latency: Duration) -> Arc<MemoryApi> {
    let data = OfficeFaker::new(seed).dataset(24, 60, 12);
    Arc::new(MemoryApi::new(data).with_latency(latency))
}
