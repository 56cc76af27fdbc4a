//! Terminal logging shared by the creative binaries.
//!
//! Records are printed in the compact `slog-term` layout, prefixed with the component name:
//!
//! `Oct 19 10:12:01.123 WARN creative-manager: Asset upload failed, keeping inline payload, module: ingest`
use std::{cell::RefCell, io, io::Write};

use slog::{o, Drain, Logger, OwnedKVList, Record, KV};
use slog_term::{
    timestamp_local, CompactFormatSerializer, CountingWriter, Decorator, RecordDecorator,
    Serializer, ThreadSafeTimestampFn,
};

pub use slog_async::Async;
pub use slog_term::TermDecorator;

/// Builds the asynchronous terminal [`Logger`] prefixing every message with `prefix`.
pub fn new_logger(prefix: &str) -> Logger {
    let decorator = TermDecorator::new().build();
    let drain = PrefixedCompactFormat::new(prefix, decorator).fuse();
    let drain = Async::new(drain).build().fuse();

    Logger::root(drain, o!("component" => prefix.to_string()))
}

/// Compact format drain writing `{timestamp} {level} {prefix}: {msg}, {key-values}`.
pub struct PrefixedCompactFormat<D: Decorator> {
    decorator: D,
    history: RefCell<Vec<(Vec<u8>, Vec<u8>)>>,
    fn_timestamp: Box<dyn ThreadSafeTimestampFn<Output = io::Result<()>>>,
    prefix: String,
}

impl<D: Decorator> PrefixedCompactFormat<D> {
    pub fn new(prefix: &str, decorator: D) -> Self {
        Self {
            decorator,
            history: RefCell::new(vec![]),
            fn_timestamp: Box::new(timestamp_local),
            prefix: prefix.to_owned(),
        }
    }
}

impl<D: Decorator> Drain for PrefixedCompactFormat<D> {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> io::Result<()> {
        self.decorator.with_record(record, values, |decorator| {
            // logger-level values are printed once, as a header, whenever they change
            let indent = {
                let mut history = self.history.borrow_mut();
                let mut serializer = CompactFormatSerializer::new(decorator, &mut *history);
                values.serialize(record, &mut serializer)?;

                serializer.finish()?
            };

            decorator.start_whitespace()?;
            write!(decorator, "{:indent$}", "", indent = indent)?;

            let comma_needed = write_header(&self.prefix, &*self.fn_timestamp, decorator, record)?;

            let mut serializer = Serializer::new(decorator, comma_needed, false);
            record.kv().serialize(record, &mut serializer)?;
            serializer.finish()?;

            decorator.start_whitespace()?;
            writeln!(decorator)?;
            decorator.flush()?;

            Ok(())
        })
    }
}

/// Writes the record header and returns whether a message was written,
/// i.e. whether the key-values need a leading comma.
fn write_header(
    prefix: &str,
    fn_timestamp: &dyn ThreadSafeTimestampFn<Output = io::Result<()>>,
    mut decorator: &mut dyn RecordDecorator,
    record: &Record<'_>,
) -> io::Result<bool> {
    decorator.start_timestamp()?;
    fn_timestamp(&mut decorator)?;

    decorator.start_whitespace()?;
    write!(decorator, " ")?;

    decorator.start_level()?;
    write!(decorator, "{}", record.level().as_short_str())?;

    decorator.start_whitespace()?;
    write!(decorator, " ")?;

    decorator.start_msg()?;
    write!(decorator, "{prefix}: ")?;

    let mut counting = CountingWriter::new(&mut decorator);
    write!(counting, "{}", record.msg())?;

    Ok(counting.count() != 0)
}
