use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;

use super::error::BuildError;
use super::spawner::Spawner;

/// Index of a node inside one `TaskGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Observable state of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeStatus {
    Pending,
    Succeeded,
    Failed(BuildError),
}

impl NodeStatus {
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, NodeStatus::Pending)
    }

    #[inline]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, NodeStatus::Succeeded)
    }

    pub fn error(&self) -> Option<&BuildError> {
        match self {
            NodeStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

type Continuation = Box<dyn FnOnce(&NodeStatus) + Send + 'static>;

struct Node {
    label: Arc<str>,
    status: NodeStatus,
    /// Outstanding dependencies; only meaningful for joins.
    pending: usize,
    /// First dependency failure observed by a join.
    failure: Option<BuildError>,
    dependents: Vec<NodeId>,
    continuations: Vec<Continuation>,
}

impl Node {
    fn new(label: Arc<str>, pending: usize) -> Self {
        Self {
            label,
            status: NodeStatus::Pending,
            pending,
            failure: None,
            dependents: Vec::new(),
            continuations: Vec::new(),
        }
    }
}

struct Shared {
    spawner: Arc<dyn Spawner>,
    nodes: Mutex<Vec<Node>>,
}

/// DAG of build tasks and join points.
///
/// Cheap to clone; clones refer to the same graph. Node ids are only
/// meaningful for the graph that issued them.
#[derive(Clone)]
pub struct TaskGraph {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("nodes", &self.shared.nodes.lock().len())
            .finish()
    }
}

impl TaskGraph {
    pub fn new(spawner: Arc<dyn Spawner>) -> Self {
        Self {
            shared: Arc::new(Shared { spawner, nodes: Mutex::new(Vec::new()) }),
        }
    }

    /// Schedules `work` on the spawner.
    ///
    /// A panic inside `work` fails the task instead of leaving it pending.
    pub fn submit<T, F>(&self, label: impl Into<String>, work: F) -> BuildTask<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, BuildError> + Send + 'static,
    {
        let task = self.new_task(label);
        let shared = Arc::clone(&self.shared);
        let (id, job_label, slot) = (task.id, Arc::clone(&task.label), Arc::clone(&task.slot));
        self.shared
            .spawner
            .spawn(Box::new(move || run_task(&shared, id, &job_label, work, &slot)));
        task
    }

    /// Schedules an asynchronous operation; the spawner polls the future.
    ///
    /// A panic while polling fails the task, as with `submit`.
    pub fn submit_async<T, Fut>(&self, label: impl Into<String>, future: Fut) -> BuildTask<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, BuildError>> + Send + 'static,
    {
        let task = self.new_task(label);
        let shared = Arc::clone(&self.shared);
        let (id, job_label, slot) = (task.id, Arc::clone(&task.label), Arc::clone(&task.slot));
        self.shared.spawner.spawn_future(
            async move {
                let outcome = AssertUnwindSafe(future).catch_unwind().await;
                settle(&shared, id, &job_label, outcome, &slot);
            }
            .boxed(),
        );
        task
    }

    /// Chains `f` after `upstream`.
    ///
    /// `f` receives a clone of the upstream result. If `upstream` fails, the new
    /// task fails with a `Dependency` error and `f` never runs.
    pub fn then<T, U, F>(&self, upstream: &BuildTask<T>, label: impl Into<String>, f: F) -> BuildTask<U>
    where
        T: Clone + Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, BuildError> + Send + 'static,
    {
        let task = self.new_task(label);
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let up = upstream.clone();
        let (id, task_label, slot) = (task.id, Arc::clone(&task.label), Arc::clone(&task.slot));

        self.on_complete(upstream.id, move |status| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match status {
                NodeStatus::Succeeded => match up.result() {
                    Ok(value) => {
                        let worker = Arc::clone(&shared);
                        shared.spawner.spawn(Box::new(move || {
                            run_task(&worker, id, &task_label, move || f(value), &slot)
                        }));
                    }
                    Err(e) => complete(&shared, id, Err(e)),
                },
                NodeStatus::Failed(cause) => {
                    let err = BuildError::Dependency {
                        node: task_label.to_string(),
                        failed: up.label().to_string(),
                        cause: Arc::new(cause.clone()),
                    };
                    complete(&shared, id, Err(err));
                }
                NodeStatus::Pending => {
                    complete(&shared, id, Err(BuildError::Unavailable { label: up.label().to_string() }))
                }
            }
        });

        task
    }

    /// Creates a join over `deps`.
    ///
    /// The join fires once every dependency has fired. It succeeds only if all
    /// of them succeeded; otherwise it fails with the first failure observed.
    /// An empty join fires immediately.
    pub fn join(&self, label: impl Into<String>, deps: impl IntoIterator<Item = NodeId>) -> JoinPoint {
        let label: Arc<str> = Arc::from(label.into());

        let (id, ready) = {
            let mut nodes = self.shared.nodes.lock();
            let id = NodeId(nodes.len());
            let mut node = Node::new(Arc::clone(&label), 0);

            for dep in deps {
                let Some(d) = nodes.get_mut(dep.0) else {
                    log::error!("join `{label}` refers to unknown node {dep:?}");
                    node.failure.get_or_insert_with(|| BuildError::Unavailable {
                        label: format!("{dep:?}"),
                    });
                    continue;
                };
                match &d.status {
                    NodeStatus::Pending => {
                        d.dependents.push(id);
                        node.pending += 1;
                    }
                    NodeStatus::Failed(cause) => {
                        if node.failure.is_none() {
                            node.failure = Some(BuildError::Dependency {
                                node: label.to_string(),
                                failed: d.label.to_string(),
                                cause: Arc::new(cause.clone()),
                            });
                        }
                    }
                    NodeStatus::Succeeded => {}
                }
            }

            let ready = (node.pending == 0).then(|| node.failure.take().map_or(Ok(()), Err));
            nodes.push(node);
            (id, ready)
        };

        if let Some(outcome) = ready {
            complete(&self.shared, id, outcome);
        }
        JoinPoint { id }
    }

    /// Registers `cont` to run once `node` fires.
    ///
    /// Runs on the thread that fires the node, or right away on the caller if
    /// the node has already fired.
    pub fn on_complete<F>(&self, node: NodeId, cont: F)
    where
        F: FnOnce(&NodeStatus) + Send + 'static,
    {
        let status = {
            let mut nodes = self.shared.nodes.lock();
            match nodes.get_mut(node.0) {
                Some(n) if n.status.is_pending() => {
                    n.continuations.push(Box::new(cont));
                    return;
                }
                Some(n) => n.status.clone(),
                None => NodeStatus::Failed(BuildError::Unavailable { label: format!("{node:?}") }),
            }
        };
        cont(&status);
    }

    pub fn status(&self, node: NodeId) -> NodeStatus {
        self.shared
            .nodes
            .lock()
            .get(node.0)
            .map(|n| n.status.clone())
            .unwrap_or_else(|| NodeStatus::Failed(BuildError::Unavailable { label: format!("{node:?}") }))
    }

    pub fn label(&self, node: NodeId) -> Option<String> {
        self.shared.nodes.lock().get(node.0).map(|n| n.label.to_string())
    }

    /// Blocks until `node` fires.
    pub fn wait(&self, node: NodeId) -> NodeStatus {
        let (tx, rx) = flume::bounded(1);
        self.on_complete(node, move |status| {
            let _ = tx.send(status.clone());
        });
        rx.recv().unwrap_or_else(|_| {
            NodeStatus::Failed(BuildError::Unavailable { label: format!("{node:?}") })
        })
    }

    /// Like `wait`, but gives up after `timeout` and returns `None`.
    pub fn wait_timeout(&self, node: NodeId, timeout: Duration) -> Option<NodeStatus> {
        let (tx, rx) = flume::bounded(1);
        self.on_complete(node, move |status| {
            let _ = tx.send(status.clone());
        });
        rx.recv_timeout(timeout).ok()
    }

    pub fn node_count(&self) -> usize {
        self.shared.nodes.lock().len()
    }

    fn new_task<T>(&self, label: impl Into<String>) -> BuildTask<T> {
        let label: Arc<str> = Arc::from(label.into());
        let id = {
            let mut nodes = self.shared.nodes.lock();
            let id = NodeId(nodes.len());
            nodes.push(Node::new(Arc::clone(&label), 1));
            id
        };
        BuildTask {
            id,
            label,
            slot: Arc::new(Mutex::new(None)),
            graph: Arc::downgrade(&self.shared),
        }
    }
}

/// Handle to a submitted unit of work and its eventual result.
///
/// Clones share the same result slot.
pub struct BuildTask<T> {
    id: NodeId,
    label: Arc<str>,
    slot: Arc<Mutex<Option<T>>>,
    graph: Weak<Shared>,
}

impl<T> Clone for BuildTask<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            label: Arc::clone(&self.label),
            slot: Arc::clone(&self.slot),
            graph: Weak::clone(&self.graph),
        }
    }
}

impl<T> std::fmt::Debug for BuildTask<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildTask")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("status", &self.status())
            .finish()
    }
}

impl<T> BuildTask<T> {
    #[inline]
    pub fn node(&self) -> NodeId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current status; `Pending` once the owning graph is gone and the task
    /// never fired.
    pub fn status(&self) -> NodeStatus {
        match self.graph.upgrade() {
            Some(shared) => shared
                .nodes
                .lock()
                .get(self.id.0)
                .map(|n| n.status.clone())
                .unwrap_or(NodeStatus::Pending),
            None => NodeStatus::Pending,
        }
    }

    /// Moves the result out. Later calls return `Unavailable`.
    pub fn take(&self) -> Result<T, BuildError> {
        match self.status() {
            NodeStatus::Succeeded => self.slot.lock().take().ok_or_else(|| self.unavailable()),
            NodeStatus::Failed(e) => Err(e),
            NodeStatus::Pending => Err(self.unavailable()),
        }
    }

    fn unavailable(&self) -> BuildError {
        BuildError::Unavailable { label: self.label.to_string() }
    }
}

impl<T: Clone> BuildTask<T> {
    pub fn result(&self) -> Result<T, BuildError> {
        match self.status() {
            NodeStatus::Succeeded => self.slot.lock().clone().ok_or_else(|| self.unavailable()),
            NodeStatus::Failed(e) => Err(e),
            NodeStatus::Pending => Err(self.unavailable()),
        }
    }
}

/// Fan-in node; fires after all of its dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinPoint {
    id: NodeId,
}

impl JoinPoint {
    #[inline]
    pub fn node(&self) -> NodeId {
        self.id
    }
}

fn run_task<T, F>(shared: &Shared, id: NodeId, label: &str, work: F, slot: &Mutex<Option<T>>)
where
    F: FnOnce() -> Result<T, BuildError>,
{
    settle(shared, id, label, panic::catch_unwind(AssertUnwindSafe(work)), slot);
}

/// Stores a task's value and fires its node. A panic payload fails the task.
fn settle<T>(
    shared: &Shared,
    id: NodeId,
    label: &str,
    outcome: std::thread::Result<Result<T, BuildError>>,
    slot: &Mutex<Option<T>>,
) {
    let outcome = match outcome {
        Ok(result) => result,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            log::error!("build task `{label}` panicked: {reason}");
            Err(BuildError::Panicked { label: label.to_string(), reason })
        }
    };

    // The value must be in place before the node reads as succeeded.
    let outcome = outcome.map(|value| {
        *slot.lock() = Some(value);
    });
    complete(shared, id, outcome);
}

/// Fires `id` and cascades into joins whose last dependency it was.
///
/// Continuations run with the node lock released.
fn complete(shared: &Shared, id: NodeId, outcome: Result<(), BuildError>) {
    let mut ready = vec![(id, outcome)];

    while let Some((id, outcome)) = ready.pop() {
        let (label, status, continuations) = {
            let mut nodes = shared.nodes.lock();
            let Some(node) = nodes.get_mut(id.0) else {
                log::error!("completion for unknown node {id:?}");
                continue;
            };
            if !node.status.is_pending() {
                log::error!("node `{}` fired twice", node.label);
                continue;
            }

            let status = match outcome {
                Ok(()) => NodeStatus::Succeeded,
                Err(e) => NodeStatus::Failed(e),
            };
            node.status = status.clone();
            let label = Arc::clone(&node.label);
            let continuations = std::mem::take(&mut node.continuations);
            let dependents = std::mem::take(&mut node.dependents);

            for dep in dependents {
                let Some(d) = nodes.get_mut(dep.0) else { continue };
                if let NodeStatus::Failed(cause) = &status {
                    if d.failure.is_none() {
                        d.failure = Some(BuildError::Dependency {
                            node: d.label.to_string(),
                            failed: label.to_string(),
                            cause: Arc::new(cause.clone()),
                        });
                    }
                }
                d.pending = d.pending.saturating_sub(1);
                if d.pending == 0 {
                    ready.push((dep, d.failure.take().map_or(Ok(()), Err)));
                }
            }

            (label, status, continuations)
        };

        match &status {
            NodeStatus::Failed(e) => log::debug!("node `{label}` failed: {e}"),
            _ => log::trace!("node `{label}` succeeded"),
        }

        for cont in continuations {
            cont(&status);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::build::{InlineSpawner, TokioSpawner};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn inline() -> TaskGraph {
        TaskGraph::new(Arc::new(InlineSpawner))
    }

    fn threaded() -> TaskGraph {
        TaskGraph::new(Arc::new(TokioSpawner::new("graph-test").unwrap()))
    }

    fn not_found(name: &str) -> BuildError {
        BuildError::NotFound { name: name.to_string() }
    }

    #[test]
    fn submit_stores_result() {
        let g = inline();
        let t = g.submit("answer", || Ok(42u32));
        assert_eq!(t.status(), NodeStatus::Succeeded);
        assert_eq!(t.result(), Ok(42));
        assert_eq!(t.take(), Ok(42));
        assert!(matches!(t.take(), Err(BuildError::Unavailable { .. })));
    }

    #[test]
    fn panicking_task_fails_instead_of_hanging() {
        let g = threaded();
        let t = g.submit::<u32, _>("boom", || panic!("kaboom"));
        let status = g.wait_timeout(t.node(), TIMEOUT).expect("task fired");
        match status {
            NodeStatus::Failed(BuildError::Panicked { label, reason }) => {
                assert_eq!(label, "boom");
                assert!(reason.contains("kaboom"));
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn then_chains_values() {
        let g = threaded();
        let a = g.submit("bytes", || Ok(vec![1u8, 2, 3]));
        let b = g.then(&a, "len", |v: Vec<u8>| Ok(v.len()));
        assert_eq!(g.wait_timeout(b.node(), TIMEOUT), Some(NodeStatus::Succeeded));
        assert_eq!(b.take(), Ok(3));
    }

    #[test]
    fn then_skips_work_after_upstream_failure() {
        let g = inline();
        let ran = Arc::new(AtomicUsize::new(0));
        let a = g.submit::<u32, _>("load", || Err(not_found("a.obj")));
        let counter = Arc::clone(&ran);
        let b = g.then(&a, "decode", move |v| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(v)
        });

        let err = b.take().unwrap_err();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(err.root_cause(), &not_found("a.obj"));
    }

    #[test]
    fn empty_join_fires_immediately() {
        let g = inline();
        let j = g.join("nothing", []);
        assert_eq!(g.status(j.node()), NodeStatus::Succeeded);
    }

    #[test]
    fn join_fires_exactly_once_after_all_dependencies() {
        let g = threaded();
        let fired = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(std::sync::Barrier::new(4));

        let tasks: Vec<_> = (0..3)
            .map(|i| {
                let gate = Arc::clone(&gate);
                g.submit(format!("t{i}"), move || {
                    gate.wait();
                    Ok(i)
                })
            })
            .collect();

        let j = g.join("all", tasks.iter().map(|t| t.node()));
        let counter = Arc::clone(&fired);
        g.on_complete(j.node(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(g.status(j.node()).is_pending());

        gate.wait();
        assert_eq!(g.wait_timeout(j.node(), TIMEOUT), Some(NodeStatus::Succeeded));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        for t in &tasks {
            assert!(t.status().is_succeeded());
        }
    }

    #[test]
    fn join_over_failure_waits_for_everything_then_fails() {
        let g = inline();
        let ok = g.submit("ok", || Ok(()));
        let bad = g.submit::<(), _>("bad", || Err(not_found("x.cso")));
        let inner = g.join("inner", [ok.node(), bad.node()]);
        let outer = g.join("outer", [inner.node()]);

        let status = g.status(outer.node());
        let err = status.error().expect("outer failed");
        assert_eq!(err.root_cause(), &not_found("x.cso"));
        match err {
            BuildError::Dependency { node, failed, .. } => {
                assert_eq!(node, "outer");
                assert_eq!(failed, "inner");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failure_does_not_touch_independent_subtrees() {
        let g = inline();
        let bad = g.submit::<(), _>("bad", || Err(not_found("bad")));
        let good = g.submit("good", || Ok(()));
        let failed_join = g.join("a", [bad.node()]);
        let good_join = g.join("b", [good.node()]);
        assert!(g.status(failed_join.node()).error().is_some());
        assert_eq!(g.status(good_join.node()), NodeStatus::Succeeded);
    }

    #[test]
    fn continuation_on_fired_node_runs_on_caller() {
        let g = inline();
        let t = g.submit("done", || Ok(()));
        let caller = std::thread::current().id();
        let (tx, rx) = flume::bounded(1);
        g.on_complete(t.node(), move |status| {
            let _ = tx.send((std::thread::current().id(), status.clone()));
        });
        let (thread, status) = rx.try_recv().expect("ran synchronously");
        assert_eq!(thread, caller);
        assert_eq!(status, NodeStatus::Succeeded);
    }

    #[test]
    fn completion_order_does_not_change_the_outcome() {
        for order in [[0usize, 1, 2], [2, 1, 0], [1, 2, 0]] {
            let g = threaded();
            let gates: Vec<_> = (0..3).map(|_| flume::bounded::<()>(1)).collect();
            let tasks: Vec<_> = gates
                .iter()
                .enumerate()
                .map(|(i, (_, rx))| {
                    let rx = rx.clone();
                    g.submit(format!("t{i}"), move || {
                        let _ = rx.recv();
                        if i == 1 { Err(not_found("mid")) } else { Ok(i) }
                    })
                })
                .collect();
            let j = g.join("all", tasks.iter().map(|t| t.node()));

            for i in order {
                let _ = gates[i].0.send(());
                let _ = g.wait_timeout(tasks[i].node(), TIMEOUT);
            }

            let status = g.wait_timeout(j.node(), TIMEOUT).expect("join fired");
            assert_eq!(status.error().map(BuildError::root_cause), Some(&not_found("mid")));
            assert_eq!(tasks[0].result(), Ok(0));
            assert_eq!(tasks[2].result(), Ok(2));
        }
    }

    #[test]
    fn async_submission_is_driven_to_completion() {
        let g = threaded();
        let t = g.submit_async("future", async { Ok::<_, BuildError>("loaded".to_string()) });
        assert_eq!(g.wait(t.node()), NodeStatus::Succeeded);
        assert_eq!(t.take().as_deref(), Ok("loaded"));
    }

    #[test]
    fn async_submission_runs_inside_the_runtime() {
        let g = threaded();
        let t = g.submit_async("reactor", async {
            Ok::<_, BuildError>(tokio::runtime::Handle::try_current().is_ok())
        });
        assert_eq!(g.wait_timeout(t.node(), TIMEOUT), Some(NodeStatus::Succeeded));
        assert_eq!(t.take(), Ok(true));
    }

    #[test]
    fn panicking_future_fails_the_task() {
        let g = inline();
        let t = g.submit_async("bad-future", async { Ok::<u32, BuildError>(None.expect("value in poll")) });
        assert!(matches!(t.status(), NodeStatus::Failed(BuildError::Panicked { .. })));
    }
}
