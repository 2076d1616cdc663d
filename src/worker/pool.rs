use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, warn};

use crate::geo::Position;
use crate::route::{
    Algorithm, Path, PathFinder, PathFinderOptions, PreprocessedGraph, RouteError, SearchOptions,
};

/// Worker-pool configuration.
#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    /// Dispatch eligible async queries to worker threads.
    pub enabled: bool,
    /// Workers to spawn. Defaults to available parallelism, and is
    /// never less than one.
    pub pool_size: Option<usize>,
}

impl WorkerOptions {
    pub(crate) fn size(&self) -> usize {
        self.pool_size
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, |n| n.get()))
            .max(1)
    }
}

type Outcome<D> = Result<Option<Path<D>>, RouteError>;

/// One dispatched query. Only transferable search options cross the
/// worker boundary; requests carrying callbacks never reach a pool.
struct Request {
    id: u64,
    start: Position,
    finish: Position,
    algorithm: Algorithm,
    avoid_sharp_turns: bool,
}

enum Job {
    Task(Request),
    Shutdown,
}

/// Handle to a pending or already resolved query.
pub struct Ticket<D = ()> {
    state: TicketState<D>,
}

enum TicketState<D> {
    Ready(Outcome<D>),
    Pending(Receiver<Outcome<D>>),
}

impl<D> Ticket<D> {
    pub(crate) fn resolved(outcome: Outcome<D>) -> Self {
        Ticket {
            state: TicketState::Ready(outcome),
        }
    }

    pub(crate) fn pending(receiver: Receiver<Outcome<D>>) -> Self {
        Ticket {
            state: TicketState::Pending(receiver),
        }
    }

    /// Blocks until the query resolves. A worker that disappears
    /// without answering reports a termination error.
    pub fn wait(self) -> Outcome<D> {
        match self.state {
            TicketState::Ready(outcome) => outcome,
            TicketState::Pending(receiver) => receiver
                .recv()
                .unwrap_or(Err(RouteError::WorkerTerminated)),
        }
    }
}

struct Dispatch {
    /// Idle workers, most recently parked on top.
    idle: Vec<usize>,
    /// Overflow requests in submission order.
    queue: VecDeque<Request>,
    senders: Vec<Option<Sender<Job>>>,
    handles: Vec<Option<JoinHandle<()>>>,
}

struct PoolShared<D> {
    graph: Arc<PreprocessedGraph<D>>,
    dispatch: Mutex<Dispatch>,
    in_flight: scc::HashMap<u64, Sender<Outcome<D>>>,
    closed: AtomicBool,
}

impl<D> PoolShared<D> {
    fn dispatch(&self) -> MutexGuard<'_, Dispatch> {
        self.dispatch.lock().expect("dispatch mutex poisoned")
    }

    /// Resolves a ticket. Results arriving after the ticket was
    /// already rejected (pool closed) are dropped here.
    fn deliver(&self, id: u64, outcome: Outcome<D>) {
        if let Some((_, sender)) = self.in_flight.remove(&id) {
            let _ = sender.send(outcome);
        }
    }
}

/// A fixed-size pool of worker threads, each running its own facade
/// over the shared preprocessed graph.
pub(crate) struct WorkerPool<D> {
    shared: Arc<PoolShared<D>>,
    next_id: AtomicU64,
}

impl<D: Clone + Send + Sync + 'static> WorkerPool<D> {
    pub(crate) fn spawn(graph: Arc<PreprocessedGraph<D>>, size: usize) -> Self {
        let shared = Arc::new(PoolShared {
            graph,
            dispatch: Mutex::new(Dispatch {
                idle: Vec::with_capacity(size),
                queue: VecDeque::new(),
                senders: Vec::with_capacity(size),
                handles: Vec::with_capacity(size),
            }),
            in_flight: scc::HashMap::default(),
            closed: AtomicBool::new(false),
        });

        {
            let mut dispatch = shared.dispatch();
            for slot in 0..size {
                spawn_worker(&shared, &mut dispatch, slot);
            }
        }

        debug!("Spawned worker pool with {} workers", size);
        WorkerPool {
            shared,
            next_id: AtomicU64::new(0),
        }
    }

    /// Dispatches a query: to the most recently idled worker when
    /// one is available, otherwise onto the overflow queue.
    pub(crate) fn submit(
        &self,
        start: Position,
        finish: Position,
        algorithm: Algorithm,
        avoid_sharp_turns: bool,
    ) -> Ticket<D> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Ticket::resolved(Err(RouteError::PoolClosed));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = bounded(1);
        let _ = self.shared.in_flight.insert(id, sender);

        let request = Request {
            id,
            start,
            finish,
            algorithm,
            avoid_sharp_turns,
        };

        let mut dispatch = self.shared.dispatch();
        match dispatch.idle.pop() {
            Some(slot) => {
                let handed_off = match &dispatch.senders[slot] {
                    Some(sender) => sender.send(Job::Task(request)).map_err(|e| e.into_inner()),
                    None => Err(Job::Task(request)),
                };
                // A vanished worker bounces the job onto the queue
                // for its replacement.
                if let Err(Job::Task(request)) = handed_off {
                    dispatch.queue.push_back(request);
                }
            }
            None => dispatch.queue.push_back(request),
        }
        drop(dispatch);

        Ticket::pending(receiver)
    }
}

impl<D> WorkerPool<D> {
    /// Rejects queued and in-flight tickets and joins every worker.
    /// Running searches cannot be interrupted; their late results
    /// are dropped on delivery. Idempotent.
    pub(crate) fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let (queued, senders, handles) = {
            let mut dispatch = self.shared.dispatch();
            let queued: Vec<Request> = dispatch.queue.drain(..).collect();
            let senders: Vec<_> = dispatch.senders.iter_mut().map(Option::take).collect();
            let handles: Vec<_> = dispatch.handles.iter_mut().filter_map(Option::take).collect();
            dispatch.idle.clear();
            (queued, senders, handles)
        };

        for request in queued {
            self.shared.deliver(request.id, Err(RouteError::PoolClosed));
        }
        self.shared.in_flight.retain(|_, sender| {
            let _ = sender.send(Err(RouteError::PoolClosed));
            false
        });

        for sender in senders.into_iter().flatten() {
            let _ = sender.send(Job::Shutdown);
        }
        for handle in handles {
            let _ = handle.join();
        }
        debug!("Worker pool closed");
    }
}

impl<D> Drop for WorkerPool<D> {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_worker<D: Clone + Send + Sync + 'static>(
    shared: &Arc<PoolShared<D>>,
    dispatch: &mut Dispatch,
    slot: usize,
) {
    let (sender, receiver) = unbounded::<Job>();
    let worker_shared = Arc::clone(shared);
    let handle = thread::Builder::new()
        .name(format!("wayfinder-worker-{slot}"))
        .spawn(move || worker_loop(worker_shared, slot, receiver))
        .expect("failed to spawn worker thread");

    if slot < dispatch.senders.len() {
        dispatch.senders[slot] = Some(sender);
        dispatch.handles[slot] = Some(handle);
    } else {
        dispatch.senders.push(Some(sender));
        dispatch.handles.push(Some(handle));
    }
}

fn worker_loop<D: Clone + Send + Sync + 'static>(
    shared: Arc<PoolShared<D>>,
    slot: usize,
    jobs: Receiver<Job>,
) {
    // Each worker rebuilds the facade in preprocessed mode with its
    // own pool disabled.
    let finder = PathFinder::from_preprocessed(
        Arc::clone(&shared.graph),
        PathFinderOptions::default(),
    );

    let mut claimed = next_request(&shared, slot);
    loop {
        let request = match claimed.take() {
            Some(request) => request,
            None => match jobs.recv() {
                Ok(Job::Task(request)) => request,
                Ok(Job::Shutdown) | Err(_) => return,
            },
        };

        let options = SearchOptions {
            algorithm: request.algorithm,
            avoid_sharp_turns: request.avoid_sharp_turns,
            ..SearchOptions::default()
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            finder.find_path(&request.start, &request.finish, &options)
        }));

        match outcome {
            Ok(outcome) => shared.deliver(request.id, outcome),
            Err(_) => {
                warn!("Worker {} terminated unexpectedly, replacing it", slot);
                shared.deliver(request.id, Err(RouteError::WorkerTerminated));
                replace_worker(&shared, slot);
                return;
            }
        }

        claimed = next_request(&shared, slot);
    }
}

/// Claims the oldest queued request, or parks the worker on the idle
/// stack. Claiming and parking share one lock so a request can never
/// sit queued while a worker sits idle.
fn next_request<D>(shared: &PoolShared<D>, slot: usize) -> Option<Request> {
    if shared.closed.load(Ordering::SeqCst) {
        return None;
    }
    let mut dispatch = shared.dispatch();
    match dispatch.queue.pop_front() {
        Some(request) => Some(request),
        None => {
            dispatch.idle.push(slot);
            None
        }
    }
}

fn replace_worker<D: Clone + Send + Sync + 'static>(shared: &Arc<PoolShared<D>>, slot: usize) {
    if shared.closed.load(Ordering::SeqCst) {
        return;
    }
    let mut dispatch = shared.dispatch();
    // The crashed thread's handle is abandoned; the slot is reused.
    dispatch.handles[slot] = None;
    spawn_worker(shared, &mut dispatch, slot);
}
