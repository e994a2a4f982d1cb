//! Line-oriented capture of child process output streams.

use std::io::{BufRead, BufReader, Read};
use std::thread::{self, JoinHandle};

/// Spawn a thread that drains `stream` line by line.
///
/// Each line is decoded lossily as UTF-8, stripped of its terminator
/// (`\n` or `\r\n`) and appended to the accumulator followed by `\n`.
/// The accumulator is returned when the stream reaches end of file, which
/// happens once the child and every process holding the pipe has exited.
pub(crate) fn spawn_line_reader<R>(stream: R, name: &'static str) -> JoinHandle<String>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || collect_lines(stream, name))
}

fn collect_lines<R: Read>(stream: R, name: &'static str) -> String {
    let mut reader = BufReader::new(stream);
    let mut accumulated = String::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                accumulated.push_str(&String::from_utf8_lossy(&line));
                accumulated.push('\n');
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(stream = name, error = %e, "stopped reading child output");
                break;
            }
        }
    }

    accumulated
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_collect_lines_normalizes_terminators() {
        let out = collect_lines(Cursor::new(b"one\r\ntwo\nthree".to_vec()), "stdout");
        assert_eq!(out, "one\ntwo\nthree\n");
    }

    #[test]
    fn test_collect_lines_empty_stream() {
        assert_eq!(collect_lines(Cursor::new(Vec::new()), "stderr"), "");
    }

    #[test]
    fn test_collect_lines_keeps_blank_lines() {
        let out = collect_lines(Cursor::new(b"a\n\nb\n".to_vec()), "stdout");
        assert_eq!(out, "a\n\nb\n");
    }

    #[test]
    fn test_collect_lines_invalid_utf8_is_replaced() {
        let out = collect_lines(Cursor::new(vec![b'o', b'k', 0xff, b'\n']), "stdout");
        assert_eq!(out, "ok\u{fffd}\n");
    }

    #[test]
    fn test_spawn_line_reader_joins_with_contents() {
        let handle = spawn_line_reader(Cursor::new(b"hello\n".to_vec()), "stdout");
        assert_eq!(handle.join().unwrap(), "hello\n");
    }
}
