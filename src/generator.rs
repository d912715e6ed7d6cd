//! Message body generation, following the decision tree of the original `genMsg`: a data
//! file takes priority over a JSON cookie, which takes priority over the default
//! dynafile/extra-data form, which takes priority over a completely fixed message.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::config::{GeneratorConfig, MessageSource};
use crate::util;

/// Produces message bodies for one connection's traffic, holding whatever file handle or
/// cursor state a particular [`MessageSource`] needs across calls.
pub enum Generator {
    Generated { cfg: GeneratedParams },
    Fixed { line: String },
    DataFile { reader: DataFileReader },
}

#[derive(Clone)]
pub struct GeneratedParams {
    pub pri: String,
    pub hostname: String,
    pub frame_delim: u8,
    pub octet_count_framed: bool,
    pub extra_data_len: usize,
    pub randomize_extra: bool,
    pub dynafile_range: Option<u32>,
    pub rfc5424: bool,
    pub json_cookie: Option<String>,
}

pub struct DataFileReader {
    path: std::path::PathBuf,
    binary: bool,
    iterations_remaining: u32,
    lines: Option<std::io::Lines<BufReader<File>>>,
    raw: Option<BufReader<File>>,
    frame_delim: u8,
    octet_count_framed: bool,
}

impl Generator {
    pub fn new(cfg: &GeneratorConfig) -> std::io::Result<Generator> {
        match &cfg.message_source {
            MessageSource::Fixed(msg) => {
                let mut line = msg.clone();
                line.push(cfg.frame_delim as char);
                Ok(Generator::Fixed { line })
            }
            MessageSource::DataFile { path, binary, iterations } => {
                Ok(Generator::DataFile {
                    reader: DataFileReader::open(path, *binary, *iterations, cfg.frame_delim, cfg.octet_count_framed)?,
                })
            }
            MessageSource::Generated { extra_data_len, randomize_extra, dynafile_range, rfc5424, json_cookie } => {
                Ok(Generator::Generated {
                    cfg: GeneratedParams {
                        pri: cfg.pri.clone(),
                        hostname: cfg.hostname.clone(),
                        frame_delim: cfg.frame_delim,
                        octet_count_framed: cfg.octet_count_framed,
                        extra_data_len: *extra_data_len,
                        randomize_extra: *randomize_extra,
                        dynafile_range: *dynafile_range,
                        rfc5424: *rfc5424,
                        json_cookie: json_cookie.clone(),
                    },
                })
            }
        }
    }

    /// Fills `msg_num` into the next message body. Returns `None` once a file-backed
    /// generator has exhausted its iterations.
    pub fn fill(&mut self, msg_num: u64) -> std::io::Result<Option<Vec<u8>>> {
        match self {
            Generator::Fixed { line } => Ok(Some(line.clone().into_bytes())),
            Generator::DataFile { reader } => reader.next_chunk(),
            Generator::Generated { cfg } => Ok(Some(cfg.render(msg_num))),
        }
    }
}

impl GeneratedParams {
    fn render(&self, msg_num: u64) -> Vec<u8> {
        let mut body = if let Some(cookie) = &self.json_cookie {
            if self.rfc5424 {
                format!(
                    "<{}>1 2003-03-01T01:00:00.000Z mymachine.example.com tcpflood - tag [tcpflood@32473 MSGNUM=\"{:08}\"] {}{{\"msgnum\":{}}}",
                    self.pri, msg_num, cookie, msg_num
                )
            } else {
                format!(
                    "<{}>Mar  1 01:00:00 {} tag {}{{\"msgnum\":{}}}",
                    self.pri, self.hostname, cookie, msg_num
                )
            }
        } else {
            let dynafile_prefix = match self.dynafile_range {
                Some(range) if range > 0 => format!("{}:", util::random_dynafile_id(range)),
                _ => String::new(),
            };
            if self.extra_data_len == 0 {
                if self.rfc5424 {
                    format!(
                        "<{}>1 2003-03-01T01:00:00.000Z mymachine.example.com tcpflood - tag [tcpflood@32473 MSGNUM=\"{:08}\"] msgnum:{}{:08}:",
                        self.pri, msg_num, dynafile_prefix, msg_num
                    )
                } else {
                    format!(
                        "<{}>Mar  1 01:00:00 {} tag msgnum:{}{:08}:",
                        self.pri, self.hostname, dynafile_prefix, msg_num
                    )
                }
            } else {
                let ed_len = if self.randomize_extra {
                    util::random_extra_data_len(self.extra_data_len)
                } else {
                    self.extra_data_len
                };
                let extra_data = "X".repeat(ed_len);
                if self.rfc5424 {
                    format!(
                        "<{}>1 2003-03-01T01:00:00.000Z mymachine.example.com tcpflood - tag [tcpflood@32473 MSGNUM=\"{:08}\"] msgnum:{}{:08}:",
                        self.pri, msg_num, dynafile_prefix, msg_num
                    )
                } else {
                    format!(
                        "<{}>Mar  1 01:00:00 {} tag msgnum:{}{:08}:{}:{}",
                        self.pri, self.hostname, dynafile_prefix, msg_num, ed_len, extra_data
                    )
                }
            }
        };
        body.push(self.frame_delim as char);
        let mut bytes = body.into_bytes();
        if self.octet_count_framed {
            let mut framed = format!("{} ", bytes.len()).into_bytes();
            framed.extend_from_slice(&bytes);
            bytes = framed;
        }
        bytes
    }
}

impl DataFileReader {
    fn open(
        path: &Path,
        binary: bool,
        iterations: u32,
        frame_delim: u8,
        octet_count_framed: bool,
    ) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let (lines, raw) = if binary {
            (None, Some(BufReader::new(file)))
        } else {
            (Some(BufReader::new(file).lines()), None)
        };
        Ok(DataFileReader {
            path: path.to_path_buf(),
            binary,
            iterations_remaining: iterations,
            lines,
            raw,
            frame_delim,
            octet_count_framed,
        })
    }

    fn rewind(&mut self) -> std::io::Result<()> {
        let file = File::open(&self.path)?;
        if self.binary {
            self.raw = Some(BufReader::new(file));
        } else {
            self.lines = Some(BufReader::new(file).lines());
        }
        Ok(())
    }

    fn next_chunk(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        if self.binary {
            loop {
                let mut buf = vec![0u8; crate::defaults::MAX_EXTRADATA_LEN + 1024];
                let n = self.raw.as_mut().unwrap().read(&mut buf)?;
                if n > 0 {
                    buf.truncate(n);
                    return Ok(Some(buf));
                }
                self.iterations_remaining = self.iterations_remaining.saturating_sub(1);
                if self.iterations_remaining == 0 {
                    return Ok(None);
                }
                self.rewind()?;
            }
        } else {
            loop {
                match self.lines.as_mut().unwrap().next() {
                    Some(line) => {
                        let mut body = line?;
                        body.push(self.frame_delim as char);
                        let mut bytes = body.into_bytes();
                        if self.octet_count_framed {
                            let mut framed = format!("{} ", bytes.len()).into_bytes();
                            framed.extend_from_slice(&bytes);
                            bytes = framed;
                        }
                        return Ok(Some(bytes));
                    }
                    None => {
                        self.iterations_remaining = self.iterations_remaining.saturating_sub(1);
                        if self.iterations_remaining == 0 {
                            return Ok(None);
                        }
                        self.rewind()?;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> GeneratedParams {
        GeneratedParams {
            pri: "167".to_string(),
            hostname: "host".to_string(),
            frame_delim: b'\n',
            octet_count_framed: false,
            extra_data_len: 0,
            randomize_extra: false,
            dynafile_range: None,
            rfc5424: false,
            json_cookie: None,
        }
    }

    #[test]
    fn plain_message_matches_exact_bytes() {
        let params = base_params();
        let body = params.render(42);
        let text = String::from_utf8(body).unwrap();
        assert_eq!(text, "<167>Mar  1 01:00:00 host tag msgnum:00000042:\n");
    }

    #[test]
    fn extra_data_adds_length_field() {
        let mut params = base_params();
        params.extra_data_len = 10;
        let body = params.render(1);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains(":10:"));
        assert!(text.contains("XXXXXXXXXX"));
    }

    #[test]
    fn octet_count_framing_prefixes_length() {
        let mut params = base_params();
        params.octet_count_framed = true;
        let body = params.render(1);
        let text = String::from_utf8(body).unwrap();
        let (len_str, rest) = text.split_once(' ').unwrap();
        let declared: usize = len_str.parse().unwrap();
        assert_eq!(declared, rest.len());
    }

    #[test]
    fn json_cookie_message_embeds_cookie_and_msgnum() {
        let mut params = base_params();
        params.json_cookie = Some("mycookie".to_string());
        let body = params.render(7);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("mycookie{\"msgnum\":7}"));
    }

    #[test]
    fn data_file_reader_wraps_around_for_extra_iterations() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "line one").unwrap();
        writeln!(file, "line two").unwrap();
        file.flush().unwrap();

        let mut reader = DataFileReader::open(file.path(), false, 2, b'\n', false).unwrap();
        let mut lines = Vec::new();
        while let Some(chunk) = reader.next_chunk().unwrap() {
            lines.push(String::from_utf8(chunk).unwrap());
        }
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "line one\n");
        assert_eq!(lines[2], "line one\n");
    }
}
