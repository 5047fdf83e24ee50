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

use logu::Colorize;
use logu::ErrorKind;
use logu::Event;
use logu::FilterOutput;
use logu::Memory;
use logu::args;

// The default logger is process-wide, so everything touching it lives in one test.
#[test]
fn test_default_logger() {
    let logger = logu::default_logger();
    assert_eq!(logger.transports(), vec!["console"]);
    assert_eq!(logu::level(), "info");

    logu::cli(Some("box"), |options| options.show_level = false);
    assert!(logger.method("help").is_some());
    let mut seen = None;
    assert!(logger.configure_transport("console", |options| {
        seen = Some((
            options.host.clone(),
            options.timestamp.is_off(),
            options.colorize == Colorize::On,
            options.show_level,
        ));
    }));
    assert_eq!(seen, Some((Some("box".to_string()), true, true, false)));

    logu::clear();
    let memory = Memory::default();
    logu::add(memory.clone()).unwrap();
    logu::log("info", args!["hello"]);
    logu::flush();
    assert_eq!(memory.lines(), vec!["info:  hello"]);

    logu::set_level("warn");
    assert_eq!(logu::level(), "warn");
    let (sender, receiver) = crossbeam_channel::bounded(1);
    logu::log_with("info", args!["hidden"], move |outcome| {
        let _ = sender.send(outcome.map(|logged| logged.is_none()));
    });
    assert!(receiver.recv().unwrap().unwrap());

    logu::add_rewriter(|_, _, _, mut meta, _| {
        meta.insert("host", "box");
        meta
    });
    logu::add_filter(|_, message, _, _| FilterOutput::from(message.to_uppercase()));
    memory.clear();
    logu::log("warn", args!["low disk"]);
    logu::flush();
    assert_eq!(memory.lines(), vec!["warn:  LOW DISK host=box"]);

    logu::remove("memory").unwrap();
    assert_eq!(logu::remove("memory").unwrap_err().kind(), ErrorKind::NotFound);

    logu::set_emit_errors(true);
    let events = logu::events();
    logu::log("warn", args!["nowhere"]);
    match events.recv().unwrap() {
        Event::Error(err) => assert_eq!(err.kind(), ErrorKind::NoTransports),
        event => panic!("unexpected event: {event:?}"),
    }
}
