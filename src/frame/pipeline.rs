//! Ordered concurrent compression pipeline for the frame writer.
//!
//! Two tiers of bounded channels carry the work: a job queue feeds a fixed
//! set of compressor workers, and each dispatched block owns a single-slot
//! result channel. The result slots are kept in dispatch order, so blocks
//! reach the sink in exactly the order they were submitted no matter which
//! worker finishes first, and the slot ring caps the number of in-flight
//! blocks at the worker count: a full ring suspends `dispatch` until the
//! oldest block has been written out.
//!
//! The sink is driven from the caller's thread at the suspension points
//! (`dispatch` when the ring is full, `finish` always), which keeps the
//! writer usable with sinks that cannot move to another thread. After the
//! first sink error, later blocks are still collected — their buffers must
//! return to the pool — but their bytes are discarded.

use std::collections::VecDeque;
use std::io::Write;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

use crate::error::Error;
use crate::frame::block::{BlockParams, FrameDataBlock};

struct Job {
    src: Vec<u8>,
    slot: Sender<FrameDataBlock>,
}

pub(crate) struct Pipeline {
    /// Job intake; dropped by `finish` so the workers drain and exit.
    jobs: Option<Sender<Job>>,
    /// Result slots in dispatch order.
    pending: VecDeque<Receiver<FrameDataBlock>>,
    workers: Vec<JoinHandle<()>>,
    num: usize,
    params: BlockParams,
    /// First sink error; everything after it is discarded.
    err: Option<Error>,
}

impl Pipeline {
    pub(crate) fn new(num: usize, params: BlockParams) -> Pipeline {
        debug_assert!(num > 1);
        let (jobs_tx, jobs_rx) = bounded::<Job>(num);
        let workers = (0..num)
            .map(|_| {
                let jobs = jobs_rx.clone();
                thread::spawn(move || {
                    for job in jobs.iter() {
                        let block = FrameDataBlock::compress(job.src, &params, None);
                        // The drain side may already be gone after an error;
                        // the block is dropped with it.
                        let _ = job.slot.send(block);
                    }
                })
            })
            .collect();
        Pipeline {
            jobs: Some(jobs_tx),
            pending: VecDeque::new(),
            workers,
            num,
            params,
            err: None,
        }
    }

    /// Queues one staged block for compression and flushes any blocks that
    /// have already finished. Suspends while `num` blocks are in flight.
    pub(crate) fn dispatch(&mut self, src: Vec<u8>, dst: &mut impl Write) -> Result<(), Error> {
        while self.pending.len() >= self.num {
            self.drain_one(dst)?;
        }
        let (slot_tx, slot_rx) = bounded(1);
        self.pending.push_back(slot_rx);
        match &self.jobs {
            Some(jobs) => jobs
                .send(Job {
                    src,
                    slot: slot_tx,
                })
                .map_err(|_| Error::InternalUnhandledState)?,
            None => return Err(Error::InternalUnhandledState),
        }
        self.drain_ready(dst)
    }

    /// Stops intake, writes every in-flight block in order, and joins the
    /// workers. Returns the first error seen, if any.
    pub(crate) fn finish(&mut self, dst: &mut impl Write) -> Result<(), Error> {
        self.jobs = None;
        let mut result = Ok(());
        while !self.pending.is_empty() {
            if let Err(e) = self.drain_one(dst) {
                // Keep draining: the remaining buffers must flow back to
                // the pool even though their bytes are discarded.
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        match self.err.take() {
            Some(e) => Err(e),
            None => result,
        }
    }

    fn drain_ready(&mut self, dst: &mut impl Write) -> Result<(), Error> {
        while let Some(front) = self.pending.front() {
            match front.try_recv() {
                Ok(block) => {
                    self.pending.pop_front();
                    self.write_block(block, dst)?;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.pending.pop_front();
                    return Err(self.latch(Error::InternalUnhandledState));
                }
            }
        }
        Ok(())
    }

    fn drain_one(&mut self, dst: &mut impl Write) -> Result<(), Error> {
        let front = match self.pending.pop_front() {
            Some(front) => front,
            None => return Ok(()),
        };
        match front.recv() {
            Ok(block) => self.write_block(block, dst),
            Err(_) => Err(self.latch(Error::InternalUnhandledState)),
        }
    }

    fn write_block(&mut self, block: FrameDataBlock, dst: &mut impl Write) -> Result<(), Error> {
        if let Some(e) = self.err {
            self.params.recycle(block.data);
            return Err(e);
        }
        let written = block.write(dst);
        self.params.recycle(block.data);
        match written {
            Ok(()) => Ok(()),
            Err(e) => Err(self.latch(e)),
        }
    }

    fn latch(&mut self, e: Error) -> Error {
        *self.err.get_or_insert(e)
    }
}
