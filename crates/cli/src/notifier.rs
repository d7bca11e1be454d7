// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use mukadam_bid_api::Notifier;
use mukadam_bid_domain::{JobId, TeamId};
use tracing::info;

/// Writes one log line per notified team. The operator relays the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, job_id: JobId, team_ids: &[TeamId]) -> usize {
        for team_id in team_ids {
            info!(job_id = %job_id, team_id = %team_id, "Team to be notified");
        }
        team_ids.len()
    }
}
