//! Playback worker and the producer-side hand-off queue

use anyhow::{anyhow, Context, Result};
use crossbeam::channel::{self, select, Receiver, Sender};
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, AudioManagerSettings, DefaultBackend, Tween};
use piano_core::{DispatchDecision, DispatchList};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Plays one sample per channel; starting a channel cuts off what it played before
pub trait SamplePlayer {
    fn channels(&self) -> usize;
    fn play(&mut self, channel: usize, path: &Path) -> Result<()>;
}

pub struct KiraPlayer {
    manager: AudioManager<DefaultBackend>,
    handles: Vec<Option<StaticSoundHandle>>,
}

impl KiraPlayer {
    pub fn new(channels: usize) -> Result<Self> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| anyhow!("Failed to create audio manager: {e}"))?;

        Ok(Self {
            manager,
            handles: (0..channels).map(|_| None).collect(),
        })
    }
}

impl SamplePlayer for KiraPlayer {
    fn channels(&self) -> usize {
        self.handles.len()
    }

    fn play(&mut self, channel: usize, path: &Path) -> Result<()> {
        if let Some(mut previous) = self.handles[channel].take() {
            previous.stop(Tween::default());
        }

        let sound = StaticSoundData::from_file(path)
            .with_context(|| format!("Failed to load sample {}", path.display()))?;
        let handle = self
            .manager
            .play(sound)
            .map_err(|e| anyhow!("Failed to play {}: {e}", path.display()))?;

        self.handles[channel] = Some(handle);
        Ok(())
    }
}

/// Producer end of the hand-off. Sending never blocks.
pub struct PlaybackQueue {
    sender: Sender<DispatchList>,
    /// Clone of the worker's receiver, used only to discard stale requests
    pending: Receiver<DispatchList>,
}

/// Consumer end, turned into a thread by [`PlaybackWorker::spawn`]
pub struct PlaybackWorker {
    lists: Receiver<DispatchList>,
    hold: Duration,
}

pub fn playback_channel(hold: Duration) -> (PlaybackQueue, PlaybackWorker) {
    let (sender, receiver) = channel::unbounded();
    (
        PlaybackQueue {
            sender,
            pending: receiver.clone(),
        },
        PlaybackWorker {
            lists: receiver,
            hold,
        },
    )
}

impl PlaybackQueue {
    /// Carry out a dispatcher decision. Returns how many lists were sent or discarded.
    pub fn apply(&self, decision: DispatchDecision) -> Result<usize> {
        match decision {
            DispatchDecision::Play(list) => {
                log::debug!("Dispatching {} sample(s): {:?}", list.len(), list);
                self.sender
                    .send(list)
                    .map_err(|_| anyhow!("Playback worker is gone"))?;
                Ok(1)
            }
            DispatchDecision::Flush => {
                let discarded = self.pending.try_iter().count();
                if discarded > 0 {
                    log::debug!("Discarded {} pending playback request(s)", discarded);
                }
                Ok(discarded)
            }
            DispatchDecision::Unchanged => Ok(0),
        }
    }

    /// Lists sent but not yet picked up by the worker
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl PlaybackWorker {
    /// Take the raw list receiver instead of running a worker thread
    pub fn into_receiver(self) -> Receiver<DispatchList> {
        self.lists
    }

    /// Start the worker thread. The player is created on that thread and
    /// this call returns only once it is ready, or with its creation error.
    ///
    /// The worker exits when `shutdown` is closed or every [`PlaybackQueue`]
    /// is dropped, without waiting for sounds that are still playing.
    pub fn spawn<P, F>(self, shutdown: Receiver<()>, make_player: F) -> Result<JoinHandle<()>>
    where
        P: SamplePlayer,
        F: FnOnce() -> Result<P> + Send + 'static,
    {
        let (started_tx, started_rx) = channel::bounded::<Result<()>>(1);

        let handle = thread::Builder::new()
            .name("playback".to_string())
            .spawn(move || {
                let player = match make_player() {
                    Ok(player) => {
                        let _ = started_tx.send(Ok(()));
                        player
                    }
                    Err(e) => {
                        let _ = started_tx.send(Err(e));
                        return;
                    }
                };
                self.run(player, shutdown);
            })
            .context("Failed to spawn playback thread")?;

        match started_rx.recv() {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e.context("Playback worker failed to start"))
            }
            Err(_) => {
                let _ = handle.join();
                anyhow::bail!("Playback worker exited during startup")
            }
        }
    }

    fn run<P: SamplePlayer>(self, mut player: P, shutdown: Receiver<()>) {
        log::info!("Playback worker ready ({} channels)", player.channels());

        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(self.lists) -> message => {
                    let Ok(list) = message else { break };
                    play_list(&mut player, &list);

                    select! {
                        recv(shutdown) -> _ => break,
                        default(self.hold) => {}
                    }
                }
            }
        }

        log::info!("Playback worker stopped");
    }
}

/// Start every entry on its own channel: entry i plays on channel i
fn play_list<P: SamplePlayer>(player: &mut P, list: &DispatchList) {
    for (channel, path) in list.iter().enumerate() {
        if channel >= player.channels() {
            log::warn!(
                "Only {} audio channels, dropping {} note(s)",
                player.channels(),
                list.len() - channel
            );
            break;
        }

        if let Err(e) = player.play(channel, path) {
            log::warn!("{:#}", e);
        }
    }
}
