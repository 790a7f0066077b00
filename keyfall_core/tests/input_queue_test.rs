use keyfall_core::input::events::LaneInput;
use keyfall_core::input::InputQueue;
use std::thread;

#[test]
fn test_input_queue_transmission() {
    let queue = InputQueue::new();
    let producer = queue.producer();

    // Polling thread
    let handle = thread::spawn(move || {
        assert!(producer.press(2, 1000.0));
        assert!(producer.release(2, 1050.0));
    });

    handle.join().unwrap();

    let mut drained = queue.drain();
    let received1 = drained.next().expect("Should receive first event");
    assert_eq!(received1.timestamp_ms, 1000.0);
    assert_eq!(received1.lane, 2);
    assert!(received1.pressed);

    let received2 = drained.next().expect("Should receive second event");
    assert_eq!(received2.timestamp_ms, 1050.0);
    assert!(!received2.pressed);

    assert!(drained.next().is_none());
}

#[test]
fn test_input_queue_drains_in_arrival_order() {
    let queue = InputQueue::new();
    let producer = queue.producer();

    producer.send(LaneInput::down(0, 10.0));
    producer.send(LaneInput::down(3, 12.0));
    producer.send(LaneInput::up(0, 11.0));

    let drained: Vec<LaneInput> = queue.drain().collect();
    assert_eq!(
        drained,
        vec![
            LaneInput::down(0, 10.0),
            LaneInput::down(3, 12.0),
            LaneInput::up(0, 11.0),
        ]
    );
    assert_eq!(queue.drain().count(), 0);
}

#[test]
fn test_producer_reports_dropped_queue() {
    let queue = InputQueue::new();
    let producer = queue.producer();
    drop(queue);

    assert!(!producer.press(0, 5.0));
}
