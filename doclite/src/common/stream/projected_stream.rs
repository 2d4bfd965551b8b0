use crate::collection::find_options::Projection;
use crate::collection::Document;
use crate::common::stream::DocumentStream;
use crate::errors::EngineResult;

/// A stream adapter that applies a projection to each document.
pub struct ProjectedStream {
    source: DocumentStream,
    projection: Projection,
}

impl ProjectedStream {
    pub fn new(source: DocumentStream, projection: Projection) -> Self {
        ProjectedStream { source, projection }
    }
}

impl Iterator for ProjectedStream {
    type Item = EngineResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.source.next()? {
            Ok(doc) => Some(Ok(self.projection.apply(&doc))),
            Err(e) => Some(Err(e)),
        }
    }
}
