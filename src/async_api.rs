use crate::{EngineConfig, Error, PdfEngine, PdfOptions, Result};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;
use url::Url;

enum Command {
    Load(Url, oneshot::Sender<Result<()>>),
    PrintToPdf(PdfOptions, oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly browser handle backed by a dedicated worker thread.
///
/// The worker thread owns a synchronous [`PdfEngine`] and executes commands
/// sent from async tasks, so the engine never has to be `Send`. Dropping the
/// handle without calling [`Browser::close`] disconnects the channel; the
/// worker then drops the engine, which releases the browser process.
pub struct Browser {
    cmd_tx: Sender<Command>,
}

impl Browser {
    /// Launch an engine on a new worker thread.
    ///
    /// `launcher` runs on the worker thread; pass `CdpEngine::new` for the
    /// Chrome backend or any constructor of another [`PdfEngine`].
    pub async fn launch<E, F>(config: EngineConfig, launcher: F) -> Result<Self>
    where
        E: PdfEngine + 'static,
        F: FnOnce(EngineConfig) -> Result<E> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let mut engine = match launcher(config) {
                Ok(e) => e,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Load(url, resp) => {
                        let res = engine.load(&url);
                        let _ = resp.send(res);
                    }
                    Command::PrintToPdf(options, resp) => {
                        let res = engine.print_to_pdf(&options);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let res = engine.close();
                        let _ = resp.send(res);
                        return;
                    }
                }
            }
            // Handle dropped without close: the engine is dropped here
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx })
    }

    /// Load `url` and wait for the page to settle
    pub async fn load(&self, url: &Url) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Load(url.clone(), tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Load canceled: {}", e)))?
    }

    /// Print the loaded page to PDF bytes
    pub async fn print_to_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::PrintToPdf(options.clone(), tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Print canceled: {}", e)))?
    }

    /// Shutdown the background worker and close the browser.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Close(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Other("Browser worker has stopped".into()))
    }
}
