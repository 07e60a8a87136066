use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::debug;

use super::session::Session;
use super::urls::BuildUrl;
use crate::error::Result;

/// Where the console log ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stdout,
    File(PathBuf),
}

impl LogSink {
    /// Stdout when dumping, otherwise a file in the working directory named
    /// after the build.
    pub fn for_build(build: &BuildUrl, dump: bool) -> Self {
        if dump {
            Self::Stdout
        } else {
            Self::File(build.log_file_name())
        }
    }
}

/// Incremental UTF-8 decoding that replaces invalid bytes with U+FFFD
/// instead of failing. Sequences split across chunks are carried over.
#[derive(Debug, Default)]
struct LossyDecoder {
    carry: Vec<u8>,
}

impl LossyDecoder {
    fn push(&mut self, chunk: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.carry);
        input.extend_from_slice(chunk);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.carry = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    fn finish(self) -> String {
        String::from_utf8_lossy(&self.carry).into_owned()
    }
}

async fn stream_log(session: &Session, build: &BuildUrl, out: &mut impl Write) -> Result<()> {
    let mut stream = session.get_stream(&build.console_text()).await?;
    let mut decoder = LossyDecoder::default();

    while let Some(chunk) = stream.next_chunk().await? {
        out.write_all(decoder.push(&chunk).as_bytes())?;
    }
    out.write_all(decoder.finish().as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Full console output of a build.
pub async fn retrieve_log(session: &Session, build: &BuildUrl) -> Result<String> {
    let mut buffer = Vec::new();
    stream_log(session, build, &mut buffer).await?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Streams the console output into `sink`, returning the file written, if any.
pub async fn dump_log(session: &Session, build: &BuildUrl, sink: &LogSink) -> Result<Option<PathBuf>> {
    match sink {
        LogSink::Stdout => {
            stream_log(session, build, &mut std::io::stdout()).await?;
            Ok(None)
        }
        LogSink::File(path) => {
            debug!("Writing console log of {build} to {}", path.display());
            let mut out = BufWriter::new(File::create(path)?);
            stream_log(session, build, &mut out).await?;
            Ok(Some(path.clone()))
        }
    }
}
