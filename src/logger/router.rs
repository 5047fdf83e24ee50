// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use crate::level::Levels;
use crate::logger::worker::Target;

/// A transport registered with a logger.
#[derive(Debug)]
pub(crate) struct Registration {
    /// Unique within a logger.
    pub(crate) name: String,
    /// Minimum level; `None` inherits the logger's level.
    pub(crate) level: Option<String>,
    pub(crate) target: Arc<Target>,
}

/// Select the registrations that should receive an entry at `level`.
///
/// A registration qualifies if the severity of its own level is at least the severity of
/// `level`, or if it has no level of its own and the severity of `default_level` is. Levels
/// missing from `levels` never qualify.
pub(crate) fn select_targets<'a>(
    registrations: &'a [Registration],
    levels: &Levels,
    default_level: &str,
    level: &str,
) -> Vec<&'a Registration> {
    let Some(severity) = levels.severity(level) else {
        return vec![];
    };
    let default_severity = levels.severity(default_level);

    registrations
        .iter()
        .filter(|registration| {
            let threshold = match &registration.level {
                Some(own) => levels.severity(own),
                None => default_severity,
            };
            threshold.is_some_and(|threshold| threshold >= severity)
        })
        .collect()
}
