use super::*;

#[test]
fn fractions_never_go_backwards() {
    let (mut tx, stream) = progress_channel();
    tx.set_message("Loading media assets...");
    tx.emit(0.1);
    tx.emit(0.05);
    tx.emit(f64::NAN);
    tx.set_message("Rendering frame 0/10...");
    tx.emit(2.0);
    drop(tx);

    let events: Vec<ProgressEvent> = stream.collect();
    let fractions: Vec<f64> = events.iter().map(|e| e.fraction).collect();
    assert_eq!(fractions, vec![0.1, 0.1, 0.1, 1.0]);
    assert_eq!(events[0].message, "Loading media assets...");
    assert_eq!(events[3].message, "Rendering frame 0/10...");
}

#[test]
fn closed_sender_emits_nothing() {
    let (mut tx, stream) = progress_channel();
    tx.emit(0.2);
    tx.close();
    tx.emit(0.9);
    assert_eq!(stream.drain_ready().len(), 1);
    assert!(stream.try_next().is_none());
}

#[test]
fn result_settles_once() {
    let (mut slot, pending) = result_channel();
    assert!(!slot.is_settled());
    assert!(slot.settle(Ok(RenderResult {
        payload: vec![1, 2],
        mime_type: "video/webm".to_owned(),
    })));
    assert!(!slot.settle(Err(ReelError::Cancelled)));
    assert!(slot.is_settled());
    let res = pending.wait().unwrap();
    assert_eq!(res.payload, vec![1, 2]);
}

#[test]
fn dropped_slot_reads_as_cancelled() {
    let (slot, mut pending) = result_channel();
    drop(slot);
    assert!(matches!(pending.try_take(), Some(Err(ReelError::Cancelled))));

    let (_slot, mut pending) = result_channel();
    assert!(pending.try_take().is_none());
}
