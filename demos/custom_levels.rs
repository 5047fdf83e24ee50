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

use logu::Levels;
use logu::Logger;
use logu::Memory;
use logu::args;

fn main() {
    let levels = Levels::new()
        .with("fatal", 0)
        .with("alert", 1)
        .with("notice", 2)
        .with("trace", 3);

    let memory = Memory::default();
    let logger = Logger::builder()
        .levels(levels)
        .colors([("fatal", "bold red"), ("notice", "cyan")])
        .level("notice")
        .pad_levels(true)
        .transport(memory.clone())
        .build()
        .unwrap();

    for name in logger.methods() {
        if let Some(method) = logger.method(&name) {
            method.log(args!["written through the %s method", name]);
        }
    }
    logger.flush();

    for line in memory.lines() {
        println!("{line}");
    }
}
