use std::io::Stdout;

use pbr::{ProgressBar, Units};

/// Counts bytes written through it on a progress bar. Without a bar it is a
/// plain pass-through writer.
pub struct ProgressBarReporter<T> {
    pb: Option<ProgressBar<Stdout>>,
    inner: T,
}

impl<T> ProgressBarReporter<T>
where
    T: std::io::Write,
{
    pub fn new(total_bytes: u64, inner: T, show: bool) -> Self {
        let pb = show.then(|| {
            let mut pb = ProgressBar::new(total_bytes);
            pb.set_units(Units::Bytes);
            pb
        });

        Self { pb, inner }
    }

    pub fn finish(&mut self) {
        if let Some(pb) = self.pb.as_mut() {
            pb.finish();
            println!();
        }
    }
}

impl<T> std::io::Write for ProgressBarReporter<T>
where
    T: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        if let Some(pb) = self.pb.as_mut() {
            pb.add(written as _);
        }
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
