// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod queue_tests;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::default_progress_database;

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database files in the temp directory, removed on drop.
pub struct ScratchDatabases {
    pub database: PathBuf,
    pub progress: PathBuf,
}

impl ScratchDatabases {
    pub fn new(name: &str) -> Self {
        let id: u64 = SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst);
        let database: PathBuf = std::env::temp_dir().join(format!(
            "branch-import-{}-{name}-{id}.db",
            std::process::id()
        ));
        let progress: PathBuf = default_progress_database(&database);
        Self { database, progress }
    }
}

fn remove_with_sidecars(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(file));
    }
}

impl Drop for ScratchDatabases {
    fn drop(&mut self) {
        remove_with_sidecars(&self.database);
        remove_with_sidecars(&self.progress);
    }
}
