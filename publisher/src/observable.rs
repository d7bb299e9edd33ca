use tokio::sync::watch;

/// Latest-value cell with a single writer and any number of readers.
///
/// Writes never wait on readers. A reader either takes a snapshot with
/// [`Observable::get`] or subscribes and is woken on each change; a slow reader
/// only ever misses intermediate values, never the latest one.
#[derive(Debug)]
pub struct Observable<T> {
    sender: watch::Sender<T>,
}

impl<T> Observable<T>
where
    T: Clone + Send + Sync,
{
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Replaces the value and wakes subscribers, returning the previous value.
    pub fn set(&self, value: T) -> T {
        self.sender.send_replace(value)
    }

    pub fn update<F>(&self, modify: F)
    where
        F: FnOnce(&mut T),
    {
        self.sender.send_modify(modify);
    }

    /// Reads the value in place without cloning it.
    pub fn with<R, F>(&self, read: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        read(&self.sender.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + Default + Send + Sync,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}
