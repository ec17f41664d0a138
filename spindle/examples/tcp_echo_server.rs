//! Example: line-based TCP echo server with Spindle

use spindle::io::{BufReader, Stream};
use spindle::net::{TcpStream, listen};

#[spindle::main]
fn main() -> spindle::Result<()> {
    // Bind a TCP echo server to localhost:9000
    let listener = listen("127.0.0.1", 9000)?;
    println!("Echo server listening on 127.0.0.1:9000");

    loop {
        // Suspends this coroutine until a client connects
        let stream = listener.accept().wait()?;
        println!("Accepted connection from {}", stream.peer_addr()?);

        // One coroutine per client
        spindle::spawn(move || handle_client(stream));
    }
}

// Echo handler: reads lines and writes them back until the client leaves
fn handle_client(stream: TcpStream) -> spindle::Result<()> {
    let mut reader = BufReader::new(stream.clone());

    loop {
        let line = reader.read_line(4096)?;
        if line.is_empty() {
            break;
        }
        stream.write(&line).wait()?;
    }

    stream.close();
    Ok(())
}
