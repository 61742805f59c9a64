// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use tracing::{debug, warn};

use crate::store::ProgressSink;

/// Best-effort progress reporting for one run.
///
/// Missing sinks, missing task ids and sink failures are all silent to the
/// caller.
pub struct Progress<'a> {
    sink: Option<&'a mut dyn ProgressSink>,
    task_id: Option<String>,
}

impl<'a> Progress<'a> {
    pub fn new(sink: Option<&'a mut dyn ProgressSink>, task_id: Option<&str>) -> Self {
        Self {
            sink,
            task_id: task_id.map(str::to_string),
        }
    }

    /// A reporter that drops every message.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            sink: None,
            task_id: None,
        }
    }

    pub fn report(&mut self, message: &str) {
        debug!(message, "Import progress");

        let (Some(sink), Some(task_id)) = (self.sink.as_deref_mut(), self.task_id.as_deref()) else {
            return;
        };

        if let Err(err) = sink.update(task_id, message) {
            warn!(task_id, error = %err, "Failed to record import progress");
        }
    }
}
