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
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use logu::Arg;
use logu::Entry;
use logu::Error;
use logu::ErrorKind;
use logu::ErrorMeta;
use logu::Event;
use logu::Logger;
use logu::Memory;
use logu::Meta;
use logu::Transport;
use logu::Trap;
use logu::args;
use serde_json::json;

#[derive(Debug, Default)]
struct Counting {
    name: String,
    level: Option<String>,
    calls: AtomicUsize,
}

impl Counting {
    fn new(name: &str, level: Option<&str>) -> Arc<Counting> {
        Arc::new(Counting {
            name: name.to_string(),
            level: level.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for Counting {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    fn log(&self, _: &Entry<'_>) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
struct Broken(&'static str);

impl Transport for Broken {
    fn name(&self) -> &str {
        self.0
    }

    fn log(&self, _: &Entry<'_>) -> Result<(), Error> {
        Err(Error::new(ErrorKind::Io, "disk full"))
    }
}

#[derive(Debug, Clone, Default)]
struct Collect(Arc<Mutex<Vec<String>>>);

impl Collect {
    fn transports(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Trap for Collect {
    fn trap(&self, err: &Error) {
        let name = err.transport().unwrap_or("-").to_string();
        self.0.lock().unwrap().push(name);
    }
}

fn memory_logger() -> (Logger, Memory) {
    let memory = Memory::default();
    let logger = Logger::builder()
        .transport(memory.clone())
        .build()
        .unwrap();
    (logger, memory)
}

#[test]
fn test_every_qualifying_transport_is_invoked_once() {
    let verbose = Counting::new("verbose", Some("silly"));
    let quiet = Counting::new("quiet", Some("warn"));
    let logger = Logger::builder()
        .shared_transport(verbose.clone())
        .shared_transport(quiet.clone())
        .build()
        .unwrap();

    let levels = logger.levels();
    for level in levels.names() {
        logger.log(level, args!["message at %s", level]);
    }
    logger.flush();

    assert_eq!(verbose.calls(), levels.len());
    // error and warn
    assert_eq!(quiet.calls(), 2);
}

#[test]
fn test_nothing_qualifies() {
    let errors_only = Counting::new("errors", Some("error"));
    let logger = Logger::builder()
        .shared_transport(errors_only.clone())
        .build()
        .unwrap();
    let events = logger.events();

    let outcome = logger.log_sync("info", args!["ignored"]);
    assert!(matches!(outcome, Ok(None)));
    logger.flush();

    assert_eq!(errors_only.calls(), 0);
    assert!(events.try_recv().is_err());
}

#[test]
fn test_undefined_message() {
    let (logger, memory) = memory_logger();
    let logged = logger.log_sync("info", args![None::<&str>]).unwrap();
    assert!(logged.is_some());
    assert_eq!(memory.lines().len(), 1);

    let logged = logger.log_sync("info", Vec::<Arg>::new()).unwrap().unwrap();
    assert_eq!(logged.message, "");
}

#[test]
fn test_error_metadata_is_kept() {
    let (logger, memory) = memory_logger();
    let err = ErrorMeta::new("x");

    let logged = logger
        .log_sync("info", args!["An error happened: ", err.clone()])
        .unwrap()
        .unwrap();
    assert_eq!(logged.message, "An error happened: ");
    assert!(matches!(&logged.meta, Meta::Error(meta) if *meta == err));

    insta::assert_snapshot!(memory.lines().join("\n"), @"info:  An error happened: Error: x");
}

#[test]
fn test_interpolation() {
    let (logger, memory) = memory_logger();
    logger
        .log_sync("info", args!["test message %s", "my string"])
        .unwrap();
    logger
        .log_sync("info", args!["%d items, %j", 3, json!(["a", 1])])
        .unwrap();
    logger
        .log_sync("info", args!["%d%% done", "abc"])
        .unwrap();

    insta::assert_snapshot!(memory.lines().join("\n"), @r#"
    info:  test message my string
    info:  3 items, ["a",1]
    info:  NaN% done
    "#);
}

#[test]
fn test_circular_metadata() {
    let (logger, memory) = memory_logger();
    let meta = logu::SharedMeta::new(Meta::object());
    meta.insert("name", "loop");
    meta.insert("self", meta.clone());

    logger.log_sync("info", args!["cycle", meta.clone()]).unwrap();
    logger.log_sync("info", args!["cycle", meta]).unwrap();

    let lines = memory.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);
    assert!(lines[0].starts_with("info:  cycle name=loop"), "{}", lines[0]);
}

#[test]
fn test_json_round_trip() {
    let memory = Memory::builder().json(true).label("api").build();
    let logger = Logger::builder()
        .transport(memory.clone())
        .build()
        .unwrap();

    logger
        .log_sync("warn", args!["auth", "token expired", json!({"user": 7})])
        .unwrap();

    let lines = memory.lines();
    let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(value["level"], "warn");
    assert_eq!(value["message"], "token expired");
    assert_eq!(value["id"], "auth");
    assert_eq!(value["label"], "api");
    assert_eq!(value["user"], 7);
    assert!(value.get("timestamp").is_none());
}

#[test]
fn test_id_column_only_grows() {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    let (logger, memory) = memory_logger();
    let mut rng = rand::rng();
    let mut widest = 10;
    for _ in 0..50 {
        let len = rng.random_range(1..30);
        let id: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        logger.log_sync("info", args![id.as_str(), "x"]).unwrap();

        let line = memory.lines().pop().unwrap();
        let column = line["info:  ".len()..].len() - "x".len();
        assert!(column > id.len(), "{line}");
        assert!(column - 1 >= widest, "{line}");
        widest = column - 1;
        memory.clear();
    }
}

#[test]
fn test_remove() {
    let memory = Memory::default();
    let other = Counting::new("other", None);
    let logger = Logger::builder()
        .transport(memory.clone())
        .shared_transport(other.clone())
        .build()
        .unwrap();

    logger.remove("memory").unwrap();
    assert_eq!(logger.transports(), vec!["other"]);
    logger.log_sync("info", args!["after"]).unwrap();
    assert!(memory.lines().is_empty());
    assert_eq!(other.calls(), 1);

    let err = logger.remove("memory").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    logger.log_sync("info", args!["again"]).unwrap();
    assert_eq!(other.calls(), 2);
}

#[test]
fn test_no_transports_and_unknown_level() {
    let logger = Logger::builder().emit_errors(true).build().unwrap();
    let err = logger.log_sync("info", args!["lost"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoTransports);

    let (logger, _) = memory_logger();
    let err = logger.log_sync("prompt", args!["lost"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownLevel);
}

#[test]
fn test_first_error_wins() {
    let trap = Collect::default();
    let logger = Logger::builder()
        .transport(Broken("a"))
        .transport(Broken("b"))
        .trap(trap.clone())
        .build()
        .unwrap();
    let events = logger.events();

    let err = logger.log_sync("info", args!["fails twice"]).unwrap_err();
    logger.flush();

    assert_eq!(err.kind(), ErrorKind::TransportWrite);
    let first = err.transport().unwrap().to_string();
    let mut all = trap.transports();
    assert_eq!(all.len(), 1);
    all.push(first);
    all.sort();
    assert_eq!(all, vec!["a", "b"]);

    // no logged event after a failure
    assert!(events.try_iter().all(|event| !matches!(event, Event::Logged(_))));
}

#[test]
fn test_errors_without_callback() {
    let logger = Logger::builder()
        .transport(Broken("broken"))
        .trap(Collect::default())
        .build()
        .unwrap();
    let events = logger.events();

    logger.log("info", args!["dropped"]);
    logger.flush();
    assert!(events.try_recv().is_err());

    logger.set_emit_errors(true);
    logger.log("info", args!["emitted"]);
    logger.flush();
    match events.try_recv() {
        Ok(Event::Error(err)) => assert_eq!(err.transport(), Some("broken")),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn test_events_in_order() {
    let (logger, _memory) = memory_logger();
    let seen = Arc::new(Mutex::new(vec![]));
    let listener = {
        let seen = seen.clone();
        logger.subscribe(move |event| {
            let name = match event {
                Event::Logging { transport, .. } => format!("logging:{transport}"),
                Event::Logged(logged) => format!("logged:{}", logged.message),
                Event::Error(_) => "error".to_string(),
            };
            seen.lock().unwrap().push(name);
        })
    };

    logger.log_sync("info", args!["one"]).unwrap();
    logger.flush();
    assert!(logger.unsubscribe(listener));
    logger.log_sync("info", args!["two"]).unwrap();
    logger.flush();

    assert_eq!(*seen.lock().unwrap(), vec!["logging:memory", "logged:one"]);
}
