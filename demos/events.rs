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

use logu::Entry;
use logu::Error;
use logu::ErrorKind;
use logu::Event;
use logu::Logger;
use logu::Memory;
use logu::Transport;
use logu::args;

#[derive(Debug)]
struct Unreachable;

impl Transport for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn level(&self) -> Option<&str> {
        Some("error")
    }

    fn log(&self, _: &Entry<'_>) -> Result<(), Error> {
        Err(Error::new(ErrorKind::Io, "connection reset"))
    }
}

fn main() {
    let logger = Logger::builder()
        .transport(Memory::default())
        .transport(Unreachable)
        .emit_errors(true)
        .build()
        .unwrap();

    logger.subscribe(|event| match event {
        Event::Logging { transport, message, .. } => println!("{transport} wrote {message:?}"),
        Event::Logged(logged) => println!("every transport wrote {:?}", logged.message),
        Event::Error(err) => println!("failed: {err}"),
    });

    logger.log("info", args!["only the memory transport sees this"]);
    logger.log("error", args!["this one fails on the unreachable transport"]);
    logger.log_with("error", args!["reported to the callback"], |outcome| {
        if let Err(err) = outcome {
            println!("callback: {:?} failed", err.transport());
        }
    });
    logger.flush();
}
