use super::SystemContext;

pub struct StdioContext;

impl SystemContext for StdioContext {
    fn writeln(&mut self, text: &str) {
        println!("{text}");
    }

    fn trace(&mut self, _text: &str) {}
}

/// Like [`StdioContext`] but mirrors resumption traces to stderr.
pub struct TraceContext;

impl SystemContext for TraceContext {
    fn writeln(&mut self, text: &str) {
        println!("{text}");
    }

    fn trace(&mut self, text: &str) {
        eprintln!("[trace] {text}");
    }
}

pub struct BufferedContext {
    buffer: String,
    traces: Vec<String>,
}

impl BufferedContext {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            traces: Vec::new(),
        }
    }

    pub fn into_data(self) -> String {
        self.buffer
    }

    pub fn traces(&self) -> &[String] {
        &self.traces
    }
}

impl Default for BufferedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemContext for BufferedContext {
    fn writeln(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn trace(&mut self, text: &str) {
        self.traces.push(text.to_string());
    }
}
