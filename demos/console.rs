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

use logu::Console;
use logu::Logger;
use logu::args;
use logu::render::PrettyPrint;
use serde_json::json;

fn main() {
    let logger = Logger::builder()
        .config(logu::config::cli())
        .level("silly")
        .transport(
            Console::builder()
                .colorize(true)
                .timestamp("short")
                .label("demo")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    logger.log("error", args!["db", "connection refused", json!({"port": 5432})]);
    logger.log("warn", args!["db", "retrying in %ds", 5]);
    logger.log("info", args!["http", "listening on %s", "0.0.0.0:8080"]);
    logger.log("data", args!["a very long identifier", "widens the id column"]);
    logger.log("debug", args!["http", "GET /health 200"]);

    logger.configure_transport("console", |options| options.pretty_print = PrettyPrint::On);
    logger.log(
        "silly",
        args!["config", "loaded", json!({"workers": 4, "tls": {"enabled": false}})],
    );
    logger.flush();
}
