/// A sink `annotate` reports coarse start/finish events to. Injected so
/// a caller can drive a progress bar without the core knowing anything
/// about terminals or UI toolkits.
pub trait ProgressSink {
    fn start(&self, label: &str);
    fn finish(&self, label: &str);
}

/// Ties a [`ProgressSink`]'s start/finish pair to this guard's lifetime:
/// `finish` fires on every exit path, including an early `?` return, via
/// `Drop`.
pub struct ProgressScope<'a> {
    sink: Option<&'a dyn ProgressSink>,
    label: &'static str,
}

impl<'a> ProgressScope<'a> {
    pub fn enter(sink: Option<&'a dyn ProgressSink>, label: &'static str) -> Self {
        if let Some(sink) = sink {
            sink.start(label);
        }
        Self { sink, label }
    }
}

impl Drop for ProgressScope<'_> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink {
            sink.finish(self.label);
        }
    }
}
