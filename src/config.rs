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

//! Built-in level presets.

use crate::level::Levels;

/// A level table together with the colors of its levels.
#[derive(Debug, Clone)]
pub struct LevelConfig {
    /// Level names and severities.
    pub levels: Levels,
    /// Level names and color specifications, e.g. `("error", "red")`.
    pub colors: Vec<(&'static str, &'static str)>,
}

/// The default levels: `error`, `warn`, `info`, `verbose`, `debug` and `silly`.
pub fn npm() -> LevelConfig {
    LevelConfig {
        levels: [
            ("error", 0),
            ("warn", 1),
            ("info", 2),
            ("verbose", 3),
            ("debug", 4),
            ("silly", 5),
        ]
        .into_iter()
        .collect(),
        colors: vec![
            ("error", "red"),
            ("warn", "yellow"),
            ("info", "green"),
            ("verbose", "cyan"),
            ("debug", "blue"),
            ("silly", "magenta"),
        ],
    }
}

/// The extended level set for interactive command line tools.
pub fn cli() -> LevelConfig {
    LevelConfig {
        levels: [
            ("error", 0),
            ("warn", 10),
            ("help", 20),
            ("data", 30),
            ("phase", 40),
            ("action", 50),
            ("info", 60),
            ("debug", 70),
            ("prompt", 80),
            ("verbose", 90),
            ("input", 100),
            ("silly", 110),
        ]
        .into_iter()
        .collect(),
        colors: vec![
            ("silly", "magenta"),
            ("input", "grey"),
            ("verbose", "grey"),
            ("prompt", "grey"),
            ("debug", "grey"),
            ("info", "green"),
            ("data", "grey"),
            ("help", "cyan"),
            ("warn", "yellow"),
            ("error", "red"),
            ("default", "cyan"),
        ],
    }
}

/// The syslog levels, `emerg` being the most severe.
pub fn syslog() -> LevelConfig {
    LevelConfig {
        levels: [
            ("emerg", 0),
            ("alert", 1),
            ("crit", 2),
            ("error", 3),
            ("warning", 4),
            ("notice", 5),
            ("info", 6),
            ("debug", 7),
        ]
        .into_iter()
        .collect(),
        colors: vec![
            ("emerg", "red"),
            ("alert", "yellow"),
            ("crit", "red"),
            ("error", "red"),
            ("warning", "red"),
            ("notice", "yellow"),
            ("info", "green"),
            ("debug", "blue"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Colors;

    #[test]
    fn test_presets_color_every_level() {
        for config in [npm(), cli(), syslog()] {
            let mut colors = Colors::default();
            colors.add(config.colors.iter().copied());
            for name in config.levels.names() {
                assert!(colors.get(name).is_some(), "missing color for {name}");
            }
        }

        // levels without a color of their own fall back to `default`
        let mut colors = Colors::default();
        colors.add(cli().colors);
        assert_eq!(colors.get("phase"), colors.get("default"));
        assert_eq!(colors.get("action"), colors.get("help"));
    }

    #[test]
    fn test_cli_severities_grow_with_verbosity() {
        let cli = cli();
        let severities = cli.levels.iter().map(|(_, s)| s).collect::<Vec<_>>();
        assert!(severities.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(cli.levels.severity("silly"), Some(110));
    }
}
