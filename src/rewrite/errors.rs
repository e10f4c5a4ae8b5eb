use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("replace function rejected occurrence {occurrence}: {source}")]
    ReplaceFn {
        occurrence: usize,
        #[source]
        source: anyhow::Error,
    },
}
