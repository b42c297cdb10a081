//! Integration tests for the rasterizers against local stand-ins.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use zpl_labelkit_core::profile::RenderGeometry;
use zpl_labelkit_preview::{ImageRenderOptions, ImageRenderer, LabelaryRenderer, PreviewError};

/// What the mock HTTP server saw.
struct Request {
    line: String,
    accept: Option<String>,
    body: String,
}

/// Serves exactly one HTTP request with a canned response.
fn mock_http(status: &'static str, body: &'static [u8]) -> (String, mpsc::Receiver<Request>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let mut content_length = 0usize;
        let mut accept = None;
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).unwrap();
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                let value = value.trim();
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.parse().unwrap();
                } else if name.eq_ignore_ascii_case("accept") {
                    accept = Some(value.to_string());
                }
            }
        }
        let mut payload = vec![0u8; content_length];
        reader.read_exact(&mut payload).unwrap();

        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .unwrap();
        stream.write_all(body).unwrap();
        stream.flush().unwrap();

        tx.send(Request {
            line: line.trim_end().to_string(),
            accept,
            body: String::from_utf8(payload).unwrap(),
        })
        .unwrap();
    });

    (base, rx)
}

fn two_by_one() -> ImageRenderOptions {
    ImageRenderOptions::new(RenderGeometry {
        dpi: 203,
        width_dots: Some(406),
        height_dots: Some(203),
    })
    .with_timeout(Duration::from_secs(5))
}

#[test]
fn labelary_posts_markup_and_returns_png() {
    let (base, seen) = mock_http("200 OK", b"\x89PNG\r\n\x1a\nfake");
    let png = LabelaryRenderer::new(base)
        .render("^XA^FDhi^FS^XZ", &two_by_one())
        .unwrap();
    assert_eq!(png, b"\x89PNG\r\n\x1a\nfake");

    let request = seen.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(
        request.line,
        "POST /v1/printers/8dpmm/labels/2.000x1.000/0/ HTTP/1.1"
    );
    assert_eq!(request.accept.as_deref(), Some("image/png"));
    assert_eq!(request.body, "^XA^FDhi^FS^XZ");
}

#[test]
fn labelary_error_status_carries_body() {
    let (base, _seen) = mock_http("400 Bad Request", b"ERROR: bad dimensions");
    let err = LabelaryRenderer::new(base)
        .render("^XA^XZ", &two_by_one())
        .unwrap_err();
    match err {
        PreviewError::Http { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "ERROR: bad dimensions");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn labelary_empty_body_is_an_error() {
    let (base, _seen) = mock_http("200 OK", b"");
    let err = LabelaryRenderer::new(base)
        .render("^XA^XZ", &two_by_one())
        .unwrap_err();
    assert!(matches!(err, PreviewError::EmptyImage));
}

#[test]
fn labelary_unreachable_host_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = LabelaryRenderer::new(format!("http://127.0.0.1:{port}"))
        .render("^XA^XZ", &two_by_one())
        .unwrap_err();
    assert!(matches!(err, PreviewError::Transport(_)));
}

#[cfg(unix)]
mod helper {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use zpl_labelkit_preview::Zpl2PngRenderer;

    fn script(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("zpl2png");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn helper_output_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        // Echo the arguments, then the markup read from stdin.
        let helper = script(&dir, "echo \"$@\"\ncat");
        let png = Zpl2PngRenderer::new(helper)
            .render("^XA^XZ", &two_by_one())
            .unwrap();
        assert_eq!(
            String::from_utf8(png).unwrap(),
            "--width-mm 51 --height-mm 25 --dpmm 8\n^XA^XZ"
        );
    }

    #[test]
    fn helper_failure_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let helper = script(&dir, "cat >/dev/null\necho 'unknown command ^ZZ' >&2\nexit 3");
        let err = Zpl2PngRenderer::new(helper)
            .render("^XA^ZZ^XZ", &two_by_one())
            .unwrap_err();
        match err {
            PreviewError::HelperFailed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "unknown command ^ZZ");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn silent_helper_is_empty_image() {
        let dir = tempfile::tempdir().unwrap();
        let helper = script(&dir, "cat >/dev/null");
        let err = Zpl2PngRenderer::new(helper)
            .render("^XA^XZ", &two_by_one())
            .unwrap_err();
        assert!(matches!(err, PreviewError::EmptyImage));
    }

    #[test]
    fn slow_helper_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let helper = script(&dir, "exec sleep 5");
        let options = two_by_one().with_timeout(Duration::from_millis(200));
        let err = Zpl2PngRenderer::new(helper)
            .render("^XA^XZ", &options)
            .unwrap_err();
        assert!(matches!(err, PreviewError::Timeout(t) if t == Duration::from_millis(200)));
    }
}
