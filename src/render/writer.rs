use anyhow::{Context, Result, anyhow};
use crossbeam::channel::{Receiver, Sender, bounded};
use hound::{WavSpec, WavWriter};
use log::{debug, info};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::thread;

/// Interleaved, already-processed samples.
pub type AudioBlock = Vec<f32>;
const BLOCK_CHANNEL_CAPACITY: usize = 32;

/// Writes blocks to a WAV file on its own thread, so the processing loop
/// never waits on the disk.
pub struct WavWriterThread {
    tx: Sender<AudioBlock>,
    handle: thread::JoinHandle<Result<u64>>,
    path: PathBuf,
}

impl WavWriterThread {
    /// Creates the file up front so path and permission errors surface here
    /// rather than on the writer thread.
    pub fn spawn(path: &Path, spec: WavSpec) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create output directory")?;
        }

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create WAV file {}", path.display()))?;
        info!("Rendering to: {}", path.display());

        let (tx, rx) = bounded::<AudioBlock>(BLOCK_CHANNEL_CAPACITY);
        let handle = thread::Builder::new()
            .name("rustfry-writer".to_string())
            .spawn(move || run_writer_thread(writer, rx))
            .context("Failed to spawn writer thread")?;

        Ok(Self {
            tx,
            handle,
            path: path.to_path_buf(),
        })
    }

    /// Fails only when the writer thread has already stopped; call
    /// [`Self::finish`] to get the reason.
    pub fn send(&self, block: AudioBlock) -> Result<()> {
        self.tx
            .send(block)
            .map_err(|_| anyhow!("Writer thread for {} stopped", self.path.display()))
    }

    /// Closes the channel, waits for the thread and finalizes the file.
    /// Returns the number of samples written.
    pub fn finish(self) -> Result<u64> {
        drop(self.tx);
        let written = self
            .handle
            .join()
            .map_err(|e| anyhow!("Writer thread panicked (join failed): {e:?}"))??;
        debug!("Wrote {written} samples to {}", self.path.display());
        Ok(written)
    }
}

fn run_writer_thread(
    mut writer: WavWriter<BufWriter<File>>,
    rx: Receiver<AudioBlock>,
) -> Result<u64> {
    let mut written = 0u64;
    for block in rx {
        for &sample in &block {
            writer
                .write_sample(sample)
                .context("Failed to write sample")?;
        }
        written += block.len() as u64;
    }

    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(written)
}
