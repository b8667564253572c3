//! Downstream consumers of emitted documents.

use std::io::Write;

use crate::document::CatalogDocument;
use crate::error::Result;

/// Receives documents one at a time, in emission order.
pub trait DocumentSink {
    fn accept(&mut self, document: CatalogDocument) -> Result<()>;

    /// Called once after a category's sequence completed.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl DocumentSink for Vec<CatalogDocument> {
    fn accept(&mut self, document: CatalogDocument) -> Result<()> {
        self.push(document);
        Ok(())
    }
}

/// Writes each document as one compact JSON line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of documents written so far.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentSink for JsonLinesSink<W> {
    fn accept(&mut self, document: CatalogDocument) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &document)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
