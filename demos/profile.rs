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

use std::thread;
use std::time::Duration;

use logu::Console;
use logu::Logger;

fn main() {
    let logger = Logger::builder()
        .transport(Console::builder().timestamp("long").build().unwrap())
        .build()
        .unwrap();

    logger.profile("startup");
    thread::sleep(Duration::from_millis(20));
    logger.profile("startup");

    let timer = logger.start_timer();
    thread::sleep(Duration::from_millis(10));
    timer.done("indexed 1000 documents");

    logger.flush();
}
