use std::io::Read;

use crate::sniff::layout::SNIFF_WINDOW;

/// Read the detection window from the start of a source.
pub fn read_sniff_window<R: Read>(src: &mut R) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::new();
    src.by_ref().take(SNIFF_WINDOW as u64).read_to_end(&mut head)?;
    Ok(head)
}

/// Byte reader that splices the unread sniff bytes ahead of the underlying
/// source, so detection never loses input.
#[derive(Debug)]
pub struct SpliceReader<R> {
    head: Vec<u8>,
    head_pos: usize,
    src: R,
}

impl<R: Read> SpliceReader<R> {
    pub fn new(head: Vec<u8>, src: R) -> Self {
        Self {
            head,
            head_pos: 0,
            src,
        }
    }

    /// Read up to `n` bytes, returning fewer only at end of input.
    pub fn read_up_to(&mut self, n: usize) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n.min(64 * 1024));

        let buffered = self.head.len() - self.head_pos;
        if buffered > 0 {
            let take = buffered.min(n);
            out.extend_from_slice(&self.head[self.head_pos..self.head_pos + take]);
            self.head_pos += take;
            if self.head_pos == self.head.len() {
                self.head = Vec::new();
                self.head_pos = 0;
            }
        }

        let mut chunk = [0u8; 8192];
        while out.len() < n {
            let want = (n - out.len()).min(chunk.len());
            let got = self.src.read(&mut chunk[..want])?;
            if got == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..got]);
        }
        Ok(out)
    }
}
