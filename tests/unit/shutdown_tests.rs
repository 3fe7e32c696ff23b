use flexchannel_rs::FlexChannel;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_tracing;

    #[tokio::test]
    async fn test_closed_write_is_silent() {
        init_tracing();
        let channel = FlexChannel::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let handle = channel
            .start(move |_data: String| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        channel.close();
        for _ in 0..1_000 {
            channel.send("test".to_string());
        }
        handle.wait().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0, "should not be received");
        assert_eq!(channel.stats().dropped, 1_000);
    }

    #[tokio::test]
    async fn test_idempotent_close() {
        init_tracing();
        let channel = FlexChannel::new();
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = results.clone();
        let handle = channel
            .start(move |item: u8| sink.lock().unwrap().push(item))
            .unwrap();

        channel.send(1);
        channel.send(2);
        channel.close();
        channel.close();
        handle.wait().await.unwrap();
        channel.close();

        assert_eq!(*results.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_send_racing_close_never_panics() {
        init_tracing();
        let channel = Arc::new(FlexChannel::new());
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = results.clone();
        let handle = channel
            .start(move |item: usize| sink.lock().unwrap().push(item))
            .unwrap();

        let producer = {
            let channel = channel.clone();
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    channel.send(i);
                }
            })
        };
        tokio::task::yield_now().await;
        channel.close();
        producer.join().unwrap();
        handle.wait().await.unwrap();

        // Whatever was accepted before the close arrives as an unbroken prefix.
        let results = results.lock().unwrap();
        let stats = channel.stats();
        assert_eq!(results.len() as u64, stats.accepted);
        assert_eq!(stats.accepted + stats.dropped, 10_000);
        for (i, item) in results.iter().enumerate() {
            assert_eq!(*item, i);
        }
    }
}
