//! A single-machine process group communicating through POSIX shared memory.
//!
//! The root process (rank 0) creates one shared memory segment holding a state
//! block and one message slot for every (source, destination) pair, then
//! re-executes the current binary once for every other rank. Spawned copies
//! find the segment through the `SIMPLE_PI_SPAWNED` environment variable and
//! claim the next free rank.
//!
//! ```rust,no_run
//! use simple_pi::group::ProcessGroup;
//!
//! let group = ProcessGroup::init(4).unwrap();
//! println!("rank {} of {} on {}", group.rank(), group.size(), group.processor_name());
//! group.finalize().unwrap();
//! ```

use crate::estimator::HitTally;
use crate::{PiError, Result};
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use shared_memory::{Shmem, ShmemConf};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

/// Upper bound on group size, fixed by the shared state layout.
pub const MAX_PROCESSES: usize = 32;

/// Environment variable carrying the segment link path to spawned ranks.
pub const SPAWNED_ENV: &str = "SIMPLE_PI_SPAWNED";

const MAX_MSG_SIZE: usize = 64 * 1024;
const HEADER_SIZE: usize = std::mem::size_of::<MessageHeader>();
const SLOT_SIZE: usize = HEADER_SIZE + MAX_MSG_SIZE;
const STATE_SIZE: usize = std::mem::size_of::<SharedState>();
const NO_SOURCE: usize = usize::MAX;

// Distinguishes segment links of groups created by one process.
static NEXT_GROUP_ID: AtomicUsize = AtomicUsize::new(0);

// Negative tags are reserved for collectives.
const BARRIER_ARRIVE_TAG: i32 = -1;
const BARRIER_COMPLETE_TAG: i32 = -2;
const BROADCAST_TAG: i32 = -3;
const GATHER_TAG: i32 = -4;
const SCATTER_TAG: i32 = -5;

#[repr(C)]
struct MessageHeader {
    valid: AtomicBool,
    received: AtomicBool,
    tag: AtomicI32,
    source: AtomicUsize,
    size: AtomicUsize,
}

#[repr(C)]
struct SharedState {
    size: AtomicUsize,
    process_ids: [AtomicUsize; MAX_PROCESSES],
    init_flags: [AtomicBool; MAX_PROCESSES],
    cleanup_ready: [AtomicBool; MAX_PROCESSES],
    done_flags: [AtomicBool; MAX_PROCESSES],
}

fn spin_until<F: Fn() -> bool>(cond: F) {
    let mut spins = 0u32;
    while !cond() {
        if spins < 1 << 16 {
            spins += 1;
            std::hint::spin_loop();
        } else {
            std::thread::yield_now();
        }
    }
}

/// Kills and reaps every child, returning how many were reaped.
fn reap_children(children: &mut Vec<Child>) -> usize {
    let mut reaped = 0;
    for mut child in children.drain(..) {
        // An already exited child is still reaped by the wait below.
        if let Err(e) = child.kill() {
            debug!("Kill of process {} failed: {}", child.id(), e);
        }
        match child.wait() {
            Ok(status) => {
                debug!("Process {} reaped with {}", child.id(), status);
                reaped += 1;
            }
            Err(e) => warn!("Could not reap process {}: {}", child.id(), e),
        }
    }
    reaped
}

/// Membership in a shared memory process group.
///
/// Every collective (`barrier`, `broadcast`, `scatter`, `gather`,
/// `reduce_sum`) must be called by all ranks in the same order.
///
/// Dropping the root without [`ProcessGroup::finalize`], including on an
/// error path, kills and reaps the ranks it spawned.
pub struct ProcessGroup {
    rank: usize,
    size: usize,
    shmem: Shmem,
    children: Vec<Child>,
}

impl ProcessGroup {
    /// Joins, or on the root creates, a group of `size` processes.
    ///
    /// Blocks until every rank has attached to the segment. Spawned ranks
    /// receive the same command line arguments as the root.
    pub fn init(size: usize) -> Result<Self> {
        if size == 0 || size > MAX_PROCESSES {
            return Err(PiError::Init(format!(
                "Size must be between 1 and {}, got {}",
                MAX_PROCESSES, size
            )));
        }

        if let Ok(link) = std::env::var(SPAWNED_ENV) {
            return Self::init_spawned(size, PathBuf::from(link));
        }

        debug!("Initializing process group with {} processes", size);

        let total_size = STATE_SIZE + size * size * SLOT_SIZE;
        let group_id = NEXT_GROUP_ID.fetch_add(1, Ordering::SeqCst);
        let link = std::env::temp_dir().join(format!("simple_pi_{}_{}", std::process::id(), group_id));
        debug!("Creating shared memory of size {} at {:?}", total_size, link);

        let shmem = ShmemConf::new()
            .size(total_size)
            .flink(&link)
            .create()
            .map_err(|e| PiError::SharedMemory(e.to_string()))?;

        let mut group = ProcessGroup {
            rank: 0,
            size,
            shmem,
            children: Vec::with_capacity(size - 1),
        };

        {
            let state = group.state();
            state.size.store(size, Ordering::SeqCst);
            for i in 0..MAX_PROCESSES {
                state.process_ids[i].store(0, Ordering::SeqCst);
                state.init_flags[i].store(false, Ordering::SeqCst);
                state.cleanup_ready[i].store(false, Ordering::SeqCst);
                state.done_flags[i].store(false, Ordering::SeqCst);
            }
            state.process_ids[0].store(std::process::id() as usize, Ordering::SeqCst);

            for src in 0..size {
                for dst in 0..size {
                    let header = group.header(src, dst);
                    header.valid.store(false, Ordering::SeqCst);
                    header.received.store(false, Ordering::SeqCst);
                    header.tag.store(0, Ordering::SeqCst);
                    header.source.store(NO_SOURCE, Ordering::SeqCst);
                    header.size.store(0, Ordering::SeqCst);
                }
            }
            state.init_flags[0].store(true, Ordering::SeqCst);
        }

        let exe = std::env::current_exe().map_err(|e| PiError::Process(e.to_string()))?;
        for _ in 1..size {
            let child = Command::new(&exe)
                .args(std::env::args_os().skip(1))
                .env(SPAWNED_ENV, &link)
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|e| PiError::Process(e.to_string()))?;
            group.children.push(child);
        }

        debug!("Root process initialized as rank 0");
        group.wait_initialized();
        Ok(group)
    }

    fn init_spawned(size: usize, link: PathBuf) -> Result<Self> {
        debug!("Spawned process attaching to {:?}", link);

        let shmem = ShmemConf::new()
            .flink(&link)
            .open()
            .map_err(|e| PiError::SharedMemory(e.to_string()))?;

        let mut group = ProcessGroup {
            rank: 0,
            size,
            shmem,
            children: Vec::new(),
        };

        let state = group.state();
        let expected = state.size.load(Ordering::SeqCst);
        if expected != size {
            return Err(PiError::Init(format!(
                "Group was created with size {}, not {}",
                expected, size
            )));
        }

        let pid = std::process::id() as usize;
        let rank = (1..size).find(|&i| {
            state.process_ids[i]
                .compare_exchange(0, pid, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        });
        let rank = rank.ok_or_else(|| PiError::Init(format!("No available ranks for process {}", pid)))?;
        state.init_flags[rank].store(true, Ordering::SeqCst);

        group.rank = rank;
        group.wait_initialized();
        debug!("Process {} initialized as rank {}", pid, rank);
        Ok(group)
    }

    fn wait_initialized(&self) {
        let state = self.state();
        spin_until(|| (0..self.size).all(|i| state.init_flags[i].load(Ordering::SeqCst)));
    }

    fn state(&self) -> &SharedState {
        // The segment starts with a SharedState and lives as long as `self`.
        unsafe { &*(self.shmem.as_ptr() as *const SharedState) }
    }

    fn slot_ptr(&self, src: usize, dst: usize) -> *mut u8 {
        let slot_index = src * self.size + dst;
        unsafe { self.shmem.as_ptr().add(STATE_SIZE + slot_index * SLOT_SIZE) }
    }

    fn header(&self, src: usize, dst: usize) -> &MessageHeader {
        unsafe { &*(self.slot_ptr(src, dst) as *const MessageHeader) }
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank >= self.size {
            return Err(PiError::InvalidRank(rank));
        }
        Ok(())
    }

    fn check_tag(tag: i32) -> Result<()> {
        if tag < 0 {
            return Err(PiError::InvalidArgument(format!(
                "tag {} is reserved for collectives",
                tag
            )));
        }
        Ok(())
    }

    /// Rank of this process, in `0..size()`. Rank 0 is the root.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of processes in the group.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Host name of the machine this rank runs on.
    pub fn processor_name(&self) -> String {
        sysinfo::System::host_name().unwrap_or_else(|| "<unknown>".to_owned())
    }

    /// Sends `data` to `dest`, blocking until the receiver has taken it.
    ///
    /// Tags must be non-negative.
    pub fn send<T: Serialize>(&self, data: &T, dest: usize, tag: i32) -> Result<()> {
        Self::check_tag(tag)?;
        self.send_tagged(data, dest, tag)
    }

    /// Receives a message with `tag` from `source`, blocking until it arrives.
    pub fn recv<T: DeserializeOwned>(&self, source: usize, tag: i32) -> Result<T> {
        Self::check_tag(tag)?;
        self.recv_tagged(source, tag)
    }

    fn send_tagged<T: Serialize>(&self, data: &T, dest: usize, tag: i32) -> Result<()> {
        self.check_rank(dest)?;
        if dest == self.rank {
            return Err(PiError::Communication(format!(
                "Rank {} cannot send to itself",
                dest
            )));
        }

        debug!("Rank {} sending to rank {} with tag {}", self.rank, dest, tag);

        let serialized = bincode::serialize(data)?;
        if serialized.len() > MAX_MSG_SIZE {
            return Err(PiError::Communication(format!(
                "Message of {} bytes exceeds the {} byte slot",
                serialized.len(),
                MAX_MSG_SIZE
            )));
        }

        let slot_ptr = self.slot_ptr(self.rank, dest);
        let header = self.header(self.rank, dest);

        spin_until(|| !header.valid.load(Ordering::SeqCst));

        header.tag.store(tag, Ordering::SeqCst);
        header.source.store(self.rank, Ordering::SeqCst);
        header.size.store(serialized.len(), Ordering::SeqCst);
        header.received.store(false, Ordering::SeqCst);
        unsafe {
            let data_ptr = slot_ptr.add(HEADER_SIZE);
            std::ptr::copy_nonoverlapping(serialized.as_ptr(), data_ptr, serialized.len());
        }
        header.valid.store(true, Ordering::SeqCst);

        debug!("Rank {} waiting for acknowledgment from rank {}", self.rank, dest);
        spin_until(|| header.received.load(Ordering::SeqCst));

        debug!("Rank {} completed send to rank {}", self.rank, dest);
        Ok(())
    }

    fn recv_tagged<T: DeserializeOwned>(&self, source: usize, tag: i32) -> Result<T> {
        self.check_rank(source)?;
        if source == self.rank {
            return Err(PiError::Communication(format!(
                "Rank {} cannot receive from itself",
                source
            )));
        }

        debug!("Rank {} receiving from rank {} with tag {}", self.rank, source, tag);

        let slot_ptr = self.slot_ptr(source, self.rank);
        let header = self.header(source, self.rank);

        spin_until(|| {
            header.valid.load(Ordering::SeqCst)
                && header.source.load(Ordering::SeqCst) == source
                && header.tag.load(Ordering::SeqCst) == tag
        });

        let bytes = unsafe {
            let data_ptr = slot_ptr.add(HEADER_SIZE);
            std::slice::from_raw_parts(data_ptr, header.size.load(Ordering::SeqCst)).to_vec()
        };

        // Acknowledge before decoding so the sender never hangs on a bad payload.
        header.received.store(true, Ordering::SeqCst);
        header.valid.store(false, Ordering::SeqCst);

        debug!("Rank {} completed receive from rank {}", self.rank, source);
        Ok(bincode::deserialize(&bytes)?)
    }

    /// Blocks until every rank has reached the barrier.
    pub fn barrier(&self) -> Result<()> {
        debug!("Rank {} entering barrier", self.rank);

        if self.rank == 0 {
            for rank in 1..self.size {
                self.recv_tagged::<()>(rank, BARRIER_ARRIVE_TAG)?;
            }
            for rank in 1..self.size {
                self.send_tagged(&(), rank, BARRIER_COMPLETE_TAG)?;
            }
        } else {
            self.send_tagged(&(), 0, BARRIER_ARRIVE_TAG)?;
            self.recv_tagged::<()>(0, BARRIER_COMPLETE_TAG)?;
        }

        debug!("Rank {} exiting barrier", self.rank);
        Ok(())
    }

    /// Returns `root`'s `data` on every rank. Non-root `data` is ignored.
    pub fn broadcast<T: Serialize + DeserializeOwned + Clone>(&self, data: &T, root: usize) -> Result<T> {
        self.check_rank(root)?;
        debug!("Rank {} entering broadcast", self.rank);

        if self.rank == root {
            for rank in (0..self.size).filter(|&r| r != root) {
                self.send_tagged(data, rank, BROADCAST_TAG)?;
            }
            Ok(data.clone())
        } else {
            self.recv_tagged(root, BROADCAST_TAG)
        }
    }

    /// Hands `data[rank]` to every rank. Only `root` supplies `data`, with
    /// exactly one item per rank.
    pub fn scatter<T: Serialize + DeserializeOwned + Clone>(&self, data: Option<&[T]>, root: usize) -> Result<T> {
        self.check_rank(root)?;
        debug!("Rank {} entering scatter", self.rank);

        let result = if self.rank == root {
            let data = data.ok_or_else(|| {
                PiError::InvalidArgument("Root must provide data for scatter".into())
            })?;
            if data.len() != self.size {
                return Err(PiError::InvalidArgument(format!(
                    "Scatter needs {} items, got {}",
                    self.size,
                    data.len()
                )));
            }
            for (rank, item) in data.iter().enumerate().filter(|&(r, _)| r != root) {
                debug!("Root sending piece to rank {}", rank);
                self.send_tagged(item, rank, SCATTER_TAG)?;
            }
            data[root].clone()
        } else {
            self.recv_tagged(root, SCATTER_TAG)?
        };

        self.barrier()?;
        debug!("Rank {} completed scatter", self.rank);
        Ok(result)
    }

    /// Collects every rank's `data` on `root`, indexed by rank.
    ///
    /// Returns `Some` on the root and `None` elsewhere.
    pub fn gather<T: Serialize + DeserializeOwned + Clone>(&self, data: &T, root: usize) -> Result<Option<Vec<T>>> {
        self.check_rank(root)?;
        debug!("Rank {} entering gather", self.rank);

        let result = if self.rank == root {
            let mut gathered = Vec::with_capacity(self.size);
            for rank in 0..self.size {
                if rank == root {
                    gathered.push(data.clone());
                } else {
                    debug!("Root receiving from rank {}", rank);
                    gathered.push(self.recv_tagged(rank, GATHER_TAG)?);
                }
            }
            Some(gathered)
        } else {
            self.send_tagged(data, root, GATHER_TAG)?;
            None
        };

        self.barrier()?;
        debug!("Rank {} completed gather", self.rank);
        Ok(result)
    }

    /// Sums every rank's tally on `root`.
    pub fn reduce_sum(&self, tally: HitTally, root: usize) -> Result<Option<HitTally>> {
        let gathered = self.gather(&tally, root)?;
        Ok(gathered.map(|all| all.into_iter().fold(HitTally::default(), HitTally::merge)))
    }

    /// Leaves the group.
    ///
    /// All ranks wait for each other; the root then waits for its spawned
    /// processes to exit and removes the segment when dropped.
    pub fn finalize(mut self) -> Result<()> {
        {
            let state = self.state();

            state.cleanup_ready[self.rank].store(true, Ordering::SeqCst);
            spin_until(|| (0..self.size).all(|i| state.cleanup_ready[i].load(Ordering::SeqCst)));

            if self.rank == 0 {
                debug!("Root waiting for ranks to detach");
                spin_until(|| (1..self.size).all(|i| state.done_flags[i].load(Ordering::SeqCst)));
            } else {
                state.done_flags[self.rank].store(true, Ordering::SeqCst);
            }
        }

        // Children left behind by an early return are reaped on drop.
        while let Some(mut child) = self.children.pop() {
            let status = child.wait().map_err(|e| PiError::Process(e.to_string()))?;
            if !status.success() {
                return Err(PiError::Process(format!("Rank process exited with {}", status)));
            }
        }

        debug!("Rank {} finished", self.rank);
        Ok(())
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if !self.children.is_empty() {
            warn!(
                "Process group dropped before finalize, stopping {} ranks",
                self.children.len()
            );
            reap_children(&mut self.children);
        }
    }
}
