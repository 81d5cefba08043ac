use fbchat_bridge::config::{Config, FRAMEBUFFER_ENV, KEYBOARD_ENV, LOG_ENV, SERVER_ENV};
use fbchat_bridge::{Session, load_font, network};
use fbchat_core::keyboard::{HidReport, Modifiers, usage};
use fbchat_core::region::CellPos;
use fbchat_core::surface::{PixelSurface, SurfaceGeometry};
use fbchat_core::{Font, Layout, TermEvent, Terminal, TerminalOptions, TogglePolicy};
use fbchat_io::KeyboardEvent;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

// ============================================================================
// Helpers
// ============================================================================

/// Long enough that the blink timer never fires during a test.
const IDLE: Duration = Duration::from_secs(3600);

fn terminal() -> Terminal<Vec<u8>> {
    let geo = SurfaceGeometry::packed(4 * 16, 7 * 32);
    let surface = PixelSurface::new(vec![0u8; geo.stride * geo.height], geo).unwrap();
    let layout = Layout::new(7, 4).unwrap();
    let mut term = Terminal::new(surface, Font::builtin(), layout, TerminalOptions::default()).unwrap();
    term.draw_chrome().unwrap();
    term
}

fn report(keys: &[u8]) -> KeyboardEvent {
    KeyboardEvent::Report(HidReport::with_keys(Modifiers::empty(), keys).to_bytes().to_vec())
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn config_file(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.server_addr(), "128.59.19.114:42000");
    assert_eq!(config.framebuffer, PathBuf::from("/dev/fb0"));
    assert_eq!((config.rows, config.cols), (24, 64));
    assert_eq!(config.blink_interval(), Duration::from_millis(250));
    assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
    assert_eq!(config.terminal_options(), TerminalOptions::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_file_overrides_some_fields() {
    let file = config_file(r#"{ "server_port": 5000, "toggle_policy": "per_report", "keyboard": "/dev/hidraw3" }"#);
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.server_port, 5000);
    assert_eq!(config.server_host, "128.59.19.114");
    assert_eq!(config.toggle_policy, TogglePolicy::PerReport);
    assert_eq!(config.keyboard, Some(PathBuf::from("/dev/hidraw3")));
    assert_eq!(config.message_size, 128);
}

#[test]
fn test_config_file_rejects_unknown_fields() {
    let file = config_file(r#"{ "server_prot": 5000 }"#);
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_config_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(&dir.path().join("nope.json")).unwrap_err();
    assert!(err.to_string().contains("nope.json"));
}

#[test]
fn test_env_overrides() {
    let mut config = Config::default();
    config
        .apply_env(env(&[
            (SERVER_ENV, "localhost:4000"),
            (FRAMEBUFFER_ENV, "/dev/fb1"),
            (KEYBOARD_ENV, "/dev/hidraw0"),
            (LOG_ENV, "debug"),
        ]))
        .unwrap();
    assert_eq!(config.server_addr(), "localhost:4000");
    assert_eq!(config.framebuffer, PathBuf::from("/dev/fb1"));
    assert_eq!(config.keyboard, Some(PathBuf::from("/dev/hidraw0")));
    assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);
}

#[test]
fn test_env_server_must_have_port() {
    let mut config = Config::default();
    assert!(config.apply_env(env(&[(SERVER_ENV, "localhost")])).is_err());
    assert!(config.apply_env(env(&[(SERVER_ENV, "localhost:http")])).is_err());
    assert_eq!(config.server_port, 42000);
}

#[test]
fn test_validate_rejects_bad_values() {
    let bad = [
        Config {
            blink_interval_ms: 0,
            ..Config::default()
        },
        Config {
            recv_size: 1,
            ..Config::default()
        },
        Config {
            message_size: 0,
            ..Config::default()
        },
        Config {
            log_level: "loud".to_string(),
            ..Config::default()
        },
    ];
    for config in bad {
        assert!(config.validate().is_err(), "{:?}", config);
    }
}

#[test]
fn test_load_font_from_psf_file() {
    let mut bytes = vec![0x36, 0x04, 0x00, 16];
    bytes.resize(4 + 256 * 16, 0);
    bytes[4 + b'x' as usize * 16] = 0xaa;
    let file = config_file("");
    std::fs::write(file.path(), &bytes).unwrap();

    let config = Config {
        font: Some(file.path().to_path_buf()),
        ..Config::default()
    };
    assert_eq!(load_font(&config).unwrap().glyph(b'x')[0], 0xaa);

    let missing = Config {
        font: Some(PathBuf::from("/nonexistent/font.psf")),
        ..Config::default()
    };
    assert!(load_font(&missing).is_err());
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_typed_message_reaches_server() {
    let (client, mut server) = tokio::io::duplex(1024);
    let (kb_tx, kb_rx) = mpsc::channel(16);
    let handle = tokio::spawn(Session::new(terminal(), IDLE, 128).run(client, kb_rx));

    for keys in [&[0x04][..], &[], &[0x05], &[usage::ENTER]] {
        kb_tx.send(report(keys)).await.unwrap();
    }
    let mut buf = [0u8; 3];
    server.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"ab\n");

    kb_tx.send(report(&[usage::ESCAPE])).await.unwrap();
    let terminal = handle.await.unwrap().unwrap();
    assert!(terminal.input().is_empty());
    assert_eq!(terminal.input().write_cursor(), CellPos::new(4, 0));
}

#[tokio::test]
async fn test_inbound_text_goes_to_output() {
    let (client, mut server) = tokio::io::duplex(1024);
    let (kb_tx, kb_rx) = mpsc::channel(16);
    let handle = tokio::spawn(Session::new(terminal(), IDLE, 4).run(client, kb_rx));

    server.write_all(b"hi\nthere").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    kb_tx.send(report(&[usage::ESCAPE])).await.unwrap();

    let terminal = handle.await.unwrap().unwrap();
    // "there" wraps past the last row and scrolls once.
    assert_eq!(terminal.output().buffer(), b"ther");
    assert_eq!(terminal.output().write_cursor(), CellPos::new(2, 1));
}

#[tokio::test]
async fn test_server_close_keeps_session_running() {
    let (client, server) = tokio::io::duplex(1024);
    let (kb_tx, kb_rx) = mpsc::channel(16);
    let handle = tokio::spawn(Session::new(terminal(), IDLE, 128).run(client, kb_rx));

    drop(server);
    tokio::time::sleep(Duration::from_millis(50)).await;
    kb_tx.send(report(&[0x04])).await.unwrap();
    kb_tx.send(report(&[])).await.unwrap();
    kb_tx.send(report(&[usage::ENTER])).await.unwrap();
    kb_tx.send(report(&[0x05])).await.unwrap();
    kb_tx.send(report(&[usage::ESCAPE])).await.unwrap();

    let terminal = handle.await.unwrap().unwrap();
    assert_eq!(terminal.input().buffer(), b"b");
}

#[tokio::test]
async fn test_keyboard_disconnect_ends_session() {
    let (client, _server) = tokio::io::duplex(64);
    let (kb_tx, kb_rx) = mpsc::channel(4);
    let handle = tokio::spawn(Session::new(terminal(), IDLE, 128).run(client, kb_rx));

    kb_tx
        .send(KeyboardEvent::Disconnected("device unplugged".to_string()))
        .await
        .unwrap();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_closed_keyboard_channel_ends_session() {
    let (client, _server) = tokio::io::duplex(64);
    let (kb_tx, kb_rx) = mpsc::channel(4);
    drop(kb_tx);
    let result = Session::new(terminal(), IDLE, 128).run(client, kb_rx).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_injected_events_are_applied_in_order() {
    let session = Session::new(terminal(), IDLE, 128);
    let tx = session.sender();
    tx.send(TermEvent::Inbound(b"ok".to_vec())).await.unwrap();
    tx.send(TermEvent::BlinkTick).await.unwrap();
    drop(tx);

    let (client, _server) = tokio::io::duplex(64);
    let (kb_tx, kb_rx) = mpsc::channel(4);
    kb_tx.send(report(&[usage::ESCAPE])).await.unwrap();

    let terminal = session.run(client, kb_rx).await.unwrap();
    assert_eq!(terminal.output().buffer(), b"ok");
    assert!(terminal.input().is_blinking());
}

#[tokio::test]
async fn test_blink_timer_drives_cursor() {
    let (client, _server) = tokio::io::duplex(64);
    let (kb_tx, kb_rx) = mpsc::channel(4);
    let handle = tokio::spawn(Session::new(terminal(), Duration::from_millis(10), 128).run(client, kb_rx));

    // Ticks interleave with the keyboard events.
    for keys in [&[0x04][..], &[], &[0x05], &[]] {
        tokio::time::sleep(Duration::from_millis(25)).await;
        kb_tx.send(report(keys)).await.unwrap();
    }
    kb_tx.send(report(&[usage::ESCAPE])).await.unwrap();

    let terminal = handle.await.unwrap().unwrap();
    assert_eq!(terminal.input().buffer(), b"ab");
}

// ============================================================================
// Network Tests
// ============================================================================

#[tokio::test]
async fn test_session_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(b"welcome\n").await.unwrap();
        let mut buf = [0u8; 2];
        socket.read_exact(&mut buf).await.unwrap();
        buf
    });

    let stream = network::connect(&addr).await.unwrap();
    let (kb_tx, kb_rx) = mpsc::channel(16);
    let handle = tokio::spawn(Session::new(terminal(), IDLE, 128).run(stream, kb_rx));

    kb_tx.send(report(&[0x1b])).await.unwrap();
    kb_tx.send(report(&[usage::ENTER])).await.unwrap();
    assert_eq!(&server.await.unwrap(), b"x\n");

    kb_tx.send(report(&[usage::ESCAPE])).await.unwrap();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    let err = network::connect(&addr).await.unwrap_err();
    assert!(err.to_string().contains(&addr));
}
