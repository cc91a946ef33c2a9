//! Reads JSON (with comments) from stdin and writes CSV to stdout.
//!
//! ```sh
//! echo '[{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]' | cargo run --example json_to_csv
//! ```

use jsonflume::{CsvEmitter, CsvOptions, FailFast, IoProducer, ParserOptions, Reader};

fn main() {
    let producer = IoProducer::new(std::io::stdin().lock());
    let mut emitter = CsvEmitter::new(String::new(), CsvOptions::default());
    let mut reader = Reader::new(producer, ParserOptions::default());

    match reader.read(&mut emitter, &mut FailFast) {
        Ok(()) => match emitter.finish() {
            Ok(csv) => print!("{csv}"),
            Err(err) => eprintln!("write error: {err}"),
        },
        Err(err) => {
            eprintln!("parse error: {err} ({})", err.kind.code());
            std::process::exit(1);
        }
    }
}
