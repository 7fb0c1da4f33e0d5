//! Observable state holder shared by the managers

use tokio::sync::watch;

/// Holds one value and notifies subscribers on every change
#[derive(Debug)]
pub struct Store<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone> Store<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Read without cloning the whole value
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Receiver that observes every later update
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Mutate in place and notify, even without live receivers
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.sender.send_modify(f);
    }

    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_updates() {
        let store = Store::new(vec![1]);
        let mut rx = store.subscribe();

        store.update(|v| v.push(2));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), vec![1, 2]);

        store.set(vec![]);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
    }

    #[test]
    fn update_without_receivers_still_applies() {
        let store: Store<u32> = Store::default();
        store.update(|v| *v += 3);
        assert_eq!(store.get(), 3);
        assert_eq!(store.read(|v| *v * 2), 6);
    }
}
