use instant::Instant;

pub fn elapsed_seconds(since: Instant) -> f64 {
    let dt = since.elapsed();
    (dt.as_secs() as f64) + (f64::from(dt.subsec_nanos()) * 1e-9)
}

/// Hierarchical timing for the one-shot ingest. Spans must be stopped in LIFO order.
pub struct Timer {
    outermost: String,
    started_at: Instant,
    stack: Vec<(String, Instant)>,
}

impl Timer {
    pub fn new<S: Into<String>>(name: S) -> Timer {
        let outermost = name.into();
        info!("{}...", outermost);
        Timer {
            outermost,
            started_at: Instant::now(),
            stack: Vec::new(),
        }
    }

    pub fn start<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        info!("{}...", name);
        self.stack.push((name, Instant::now()));
    }

    pub fn stop<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        let (top, started_at) = self.stack.pop().expect("stop() without a matching start()");
        if top != name {
            panic!("stop(\"{}\") doesn't match start(\"{}\")", name, top);
        }
        info!("{} took {:.2}s", top, elapsed_seconds(started_at));
    }

    pub fn done(self) {
        assert!(self.stack.is_empty(), "done() with spans still open");
        info!(
            "{} took {:.2}s total",
            self.outermost,
            elapsed_seconds(self.started_at)
        );
    }
}
