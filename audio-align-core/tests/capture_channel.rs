use std::sync::Arc;
use std::thread;
use std::time::Duration;

use audio_align_core::{BoundedAudioChannel, ExactCountStream};

#[test]
fn test_scenario_write_then_read() {
    let channel = BoundedAudioChannel::new(10, true).unwrap();
    channel.write(b"ABCD");

    assert_eq!(channel.read_vec(4), b"ABCD");
    assert_eq!(channel.bytes_available(), 0);
}

#[test]
fn test_scenario_overrun_keeps_last_capacity_bytes() {
    let channel = BoundedAudioChannel::new(10, true).unwrap();
    let data = b"0123456789AB";
    channel.write(data);

    let stats = channel.statistics();
    assert_eq!(stats.bytes_available, 10);
    assert_eq!(stats.bytes_overrun, 2);
    assert_eq!(channel.read_vec(10), &data[2..]);
}

#[test]
fn test_overrun_amount_for_any_excess() {
    for excess in 1..25usize {
        let channel = BoundedAudioChannel::new(16, false).unwrap();
        let data: Vec<u8> = (0..(16 + excess) as u8).collect();
        for piece in data.chunks(5) {
            channel.write(piece);
        }

        let stats = channel.statistics();
        assert_eq!(stats.bytes_available, 16);
        assert_eq!(stats.bytes_overrun, excess as u64);
        assert_eq!(channel.read_vec(16), &data[excess..]);
    }
}

#[test]
fn test_producer_consumer_fifo_without_loss() {
    let stream = ExactCountStream::new(Arc::new(BoundedAudioChannel::new(37, true).unwrap()));
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

    let producer = {
        let stream = stream.clone();
        let data = data.clone();
        thread::spawn(move || {
            for piece in data.chunks(13) {
                assert_eq!(stream.write_exact(piece), piece.len());
            }
        })
    };

    let mut received = Vec::new();
    while received.len() < data.len() {
        let block = stream.read_exact_vec(64.min(data.len() - received.len()));
        assert!(!block.is_empty());
        received.extend_from_slice(&block);
    }
    producer.join().unwrap();
    stream.close();

    assert_eq!(received, data);
    let stats = stream.channel().statistics();
    assert_eq!(stats.bytes_overrun, 0);
    assert_eq!(stats.bytes_read, stats.bytes_written);
}

#[test]
fn test_lossy_producer_never_blocks() {
    let channel = Arc::new(BoundedAudioChannel::new(8, true).unwrap());
    let producer = {
        let channel = Arc::clone(&channel);
        thread::spawn(move || {
            for _ in 0..1_000 {
                assert_eq!(channel.write(&[1, 2, 3]), 3);
            }
        })
    };
    producer.join().unwrap();

    let stats = channel.statistics();
    assert_eq!(stats.bytes_written, 3_000);
    assert_eq!(stats.bytes_overrun, 3_000 - 8);
    assert_eq!(stats.bytes_available, 8);
}

#[test]
fn test_close_releases_blocked_exact_reader() {
    let stream = ExactCountStream::new(Arc::new(BoundedAudioChannel::new(32, true).unwrap()));
    let reader = {
        let stream = stream.clone();
        thread::spawn(move || stream.read_exact_vec(16))
    };

    stream.write_exact(&[7; 5]);
    while stream.channel().statistics().bytes_read < 5 {
        thread::sleep(Duration::from_millis(1));
    }
    stream.close();

    // only what the reader took before closure
    assert_eq!(reader.join().unwrap(), vec![7; 5]);
}

#[test]
fn test_close_abandons_unread_bytes() {
    let stream = ExactCountStream::new(Arc::new(BoundedAudioChannel::new(32, true).unwrap()));
    assert_eq!(stream.write_exact(&[3; 12]), 12);
    stream.close();

    assert!(stream.read_exact_vec(4).is_empty());
    assert!(stream.channel().read_vec(4).is_empty());
    assert_eq!(stream.channel().statistics().bytes_read, 0);
}
