use spindle::io::{BufReader, Stream};
use spindle::net::{TcpListener, TcpStream, connect, listen};
use spindle::{Promise, Runtime, spawn, yield_now};
use std::io;
use std::net::Shutdown;
use std::rc::Rc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Accepts one connection and echoes it line by line until the peer stops
/// writing. Resolves with the number of bytes echoed.
fn echo_once(listener: TcpListener) -> Promise<usize> {
    spawn(move || {
        let stream = listener.accept().wait()?;
        let mut reader = BufReader::new(stream.clone());
        let mut echoed = 0;

        loop {
            let line = reader.read_line(1024)?;
            if line.is_empty() {
                break;
            }
            echoed += stream.write(&line).wait()?;
        }

        stream.close();
        Ok(echoed)
    })
}

#[spindle::test]
fn echoes_lines_back() {
    init_logger();

    let listener = listen("127.0.0.1", 0).unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = echo_once(listener);

    let client = connect("127.0.0.1", port).wait().unwrap();
    assert_eq!(client.peer_addr().unwrap().port(), port);

    let mut reader = BufReader::new(client.clone());

    assert_eq!(client.write(b"hello\n").wait().unwrap(), 6);
    assert_eq!(reader.read_line(1024).unwrap(), b"hello\n");

    client.write(b"world\n").wait().unwrap();
    assert_eq!(reader.read_line(1024).unwrap(), b"world\n");

    client.shutdown(Shutdown::Write).unwrap();
    assert!(reader.read_line(1024).unwrap().is_empty());

    assert_eq!(server.wait().unwrap(), 12);
}

#[spindle::test]
fn large_writes_complete_across_many_turns() {
    let listener = listen("127.0.0.1", 0).unwrap();
    let port = listener.local_addr().unwrap().port();

    let payload: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = payload.len();

    let server = spawn(move || {
        let stream = listener.accept().wait()?;
        let mut reader = BufReader::with_chunk_size(64 * 1024, stream);
        reader.read_exact(expected)
    });

    let client = connect("127.0.0.1", port).wait().unwrap();
    assert_eq!(client.write(&payload).wait().unwrap(), expected);

    let received = server.wait().unwrap();
    assert_eq!(received.len(), expected);
    assert!(received == payload);
}

#[spindle::test]
fn peer_close_reads_as_end_of_stream() {
    let listener = listen("127.0.0.1", 0).unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = spawn(move || {
        let stream = listener.accept().wait()?;
        let peer = stream.peer_addr()?;
        stream.close();
        Ok(peer)
    });

    let client = connect("127.0.0.1", port).wait().unwrap();
    let peer = server.wait().unwrap();

    assert_eq!(peer, client.local_addr().unwrap());
    assert!(client.read(64).wait().unwrap().is_empty());
}

#[spindle::test]
fn connection_refused_is_reported() {
    let port = {
        let vacant = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        vacant.local_addr().unwrap().port()
    };

    let err = connect("127.0.0.1", port).wait().unwrap_err();

    assert_eq!(err.io_kind(), Some(io::ErrorKind::ConnectionRefused));
}

#[spindle::test]
fn closing_listener_cancels_pending_accept() {
    let listener = Rc::new(listen("127.0.0.1", 0).unwrap());

    let accepting = listener.clone();
    let pending = spawn(move || accepting.accept().wait());

    yield_now();
    listener.close();

    assert!(pending.wait().unwrap_err().is_cancelled());
}

#[spindle::test]
fn closed_stream_rejects_operations() {
    let listener = listen("127.0.0.1", 0).unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = spawn(move || listener.accept().wait());

    let client = connect("127.0.0.1", port).wait().unwrap();
    let _server_side: TcpStream = server.wait().unwrap();

    client.close();
    client.close();

    assert!(client.is_closed());
    assert!(client.read(16).wait().unwrap_err().is_cancelled());
    assert!(client.write(b"x").wait().unwrap_err().is_cancelled());
}

#[test]
fn sockets_outliving_their_runtime_leave_the_next_one_alone() {
    init_logger();

    let stale = {
        let runtime = Runtime::new();
        runtime.block_on(|| listen("127.0.0.1", 0)).unwrap()
    };

    let runtime = Runtime::new();
    runtime.block_on(move || {
        let fresh = listen("127.0.0.1", 0).unwrap();
        let port = fresh.local_addr().unwrap().port();

        assert!(stale.accept().wait().unwrap_err().is_cancelled());
        drop(stale);

        let server = spawn(move || fresh.accept().wait());
        let client = connect("127.0.0.1", port).wait().unwrap();
        let accepted = server.wait().unwrap();

        assert_eq!(accepted.peer_addr().unwrap(), client.local_addr().unwrap());
    });
}
