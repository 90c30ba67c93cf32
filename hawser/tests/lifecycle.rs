mod helpers;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use hawser::{FreeUserDataFn, HawserError, TopicType, UserData};
use hawser_mock::MockBehavior;
use helpers::*;

#[tokio::test(flavor = "multi_thread")]
async fn retain_n_release_n_plus_one_tears_down_once() {
    for n in [0usize, 1, 3, 8] {
        let (hawser, ctl) = hawser_on_current();
        let handle = create_handle(&hawser).await;
        assert_eq!(hawser.ref_count(handle), 1);

        for i in 0..n {
            let before = hawser.ref_count(handle);
            hawser.retain(handle);
            assert!(hawser.ref_count(handle) > before);
            assert_eq!(hawser.ref_count(handle), i + 2);
        }
        for _ in 0..n {
            hawser.release(handle);
            assert_eq!(ctl.close_count(), 0, "teardown before the final release");
        }
        assert_eq!(hawser.ref_count(handle), 1);

        hawser.release(handle);
        assert_eq!(ctl.close_count(), 1);
        assert_eq!(ctl.open_connections(), 0);
        assert_eq!(hawser.ref_count(handle), 0);
        assert_eq!(hawser.live_handles(), 0);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_retain_release_keeps_count_consistent() {
    let (hawser, ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;

    let mut workers = Vec::new();
    for _ in 0..8 {
        let h = hawser.clone();
        workers.push(std::thread::spawn(move || {
            for _ in 0..500 {
                h.retain(handle);
                h.release(handle);
            }
        }));
    }
    for w in workers {
        w.join().expect("worker panicked");
    }

    assert_eq!(hawser.ref_count(handle), 1);
    assert_eq!(ctl.close_count(), 0);
    hawser.release(handle);
    assert_eq!(ctl.close_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_create_delivers_error_and_no_handle() {
    let (hawser, ctl) = hawser_on_current();
    ctl.set_connect_behavior(MockBehavior::Fail(HawserError::transport(401_004, "token expired")));

    let (cb, rx) = capture();
    hawser.create(config(), cb, UserData::new(7_u64));
    let outcome = wait(rx).await;

    assert!(outcome.handle.is_none());
    assert_eq!(outcome.error.as_ref().map(HawserError::code), Some(401_004));
    assert_eq!(outcome.userdata, Some(7));
    assert_eq!(hawser.live_handles(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_config_fails_before_contacting_backend() {
    let (hawser, ctl) = hawser_on_current();
    let (cb, rx) = capture();
    hawser.create(
        hawser::Config::new("key", "", "token"),
        cb,
        UserData::none(),
    );
    let outcome = wait(rx).await;
    assert!(matches!(
        outcome.error,
        Some(HawserError::MissingCredential { .. })
    ));
    assert!(ctl.connect_requests().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
#[should_panic(expected = "usage error")]
async fn double_release_is_fatal() {
    let (hawser, _ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;
    hawser.release(handle);
    hawser.release(handle);
}

#[tokio::test(flavor = "multi_thread")]
#[should_panic(expected = "usage error")]
async fn retain_after_release_is_fatal() {
    let (hawser, _ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;
    hawser.release(handle);
    hawser.retain(handle);
}

#[tokio::test(flavor = "multi_thread")]
#[should_panic(expected = "usage error")]
async fn subscribe_on_released_handle_is_fatal() {
    let (hawser, _ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;
    hawser.release(handle);
    hawser.subscribe(handle, &[TopicType::Private], |_| {}, UserData::none());
}

fn recording_free(log: &Arc<Mutex<Vec<u64>>>) -> FreeUserDataFn {
    let log = Arc::clone(log);
    Arc::new(move |value| {
        if let Ok(v) = value.downcast::<u64>() {
            log.lock().unwrap().push(*v);
        }
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn set_userdata_frees_the_replaced_value_immediately() {
    let (hawser, _ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;
    let freed = Arc::new(Mutex::new(Vec::new()));
    hawser.set_free_userdata_func(handle, Some(recording_free(&freed)));

    hawser.set_userdata(handle, Some(1_u64));
    assert!(freed.lock().unwrap().is_empty());
    hawser.set_userdata(handle, Some(2_u64));
    assert_eq!(*freed.lock().unwrap(), vec![1]);
    assert_eq!(hawser.userdata::<u64>(handle), Some(2));
    assert!(hawser.with_userdata(handle, |v| v.is_some_and(|v| v.is::<u64>())));

    hawser.release(handle);
    assert_eq!(*freed.lock().unwrap(), vec![1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn userdata_closure_may_call_back_into_the_same_handle() {
    let (hawser, _ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;
    let freed = Arc::new(Mutex::new(Vec::new()));
    hawser.set_free_userdata_func(handle, Some(recording_free(&freed)));
    hawser.set_userdata(handle, Some(1_u64));

    let seen = hawser.with_userdata(handle, |v| {
        let inner = hawser.userdata::<u64>(handle);
        hawser.set_userdata(handle, Some(2_u64));
        // Still borrowed here, so not freed yet.
        assert!(freed.lock().unwrap().is_empty());
        (v.and_then(|v| v.downcast_ref::<u64>()).copied(), inner)
    });
    assert_eq!(seen, (Some(1), Some(1)));
    assert_eq!(*freed.lock().unwrap(), vec![1]);
    assert_eq!(hawser.userdata::<u64>(handle), Some(2));

    hawser.release(handle);
    assert_eq!(*freed.lock().unwrap(), vec![1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn clearing_userdata_frees_it_and_teardown_frees_nothing_twice() {
    let (hawser, _ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;
    let freed = Arc::new(Mutex::new(Vec::new()));
    hawser.set_free_userdata_func(handle, Some(recording_free(&freed)));

    hawser.set_userdata(handle, Some(5_u64));
    hawser.set_userdata::<u64>(handle, None);
    assert_eq!(*freed.lock().unwrap(), vec![5]);
    assert_eq!(hawser.userdata::<u64>(handle), None);

    hawser.release(handle);
    assert_eq!(*freed.lock().unwrap(), vec![5]);
}

#[tokio::test(flavor = "multi_thread")]
async fn userdata_without_free_func_is_just_dropped() {
    let (hawser, _ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;
    let token = Arc::new(());
    hawser.set_userdata(handle, Some(Arc::clone(&token)));
    assert_eq!(Arc::strong_count(&token), 2);
    hawser.release(handle);
    assert_eq!(Arc::strong_count(&token), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn push_registration_userdata_is_freed_on_replace_and_teardown() {
    let (hawser, _ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;
    let frees = counter();

    let tracked = |frees: &Arc<std::sync::atomic::AtomicUsize>| {
        let frees = Arc::clone(frees);
        UserData::with_free((), move |()| {
            frees.fetch_add(1, Ordering::SeqCst);
        })
    };

    hawser.set_on_order_changed(handle, |_, _, _| {}, tracked(&frees));
    hawser.set_on_order_changed(handle, |_, _, _| {}, tracked(&frees));
    assert_eq!(frees.load(Ordering::SeqCst), 1);

    hawser.release(handle);
    assert_eq!(frees.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_the_facade_tears_down_live_handles() {
    let (hawser, ctl) = hawser_on_current();
    let handle = create_handle(&hawser).await;
    let freed = Arc::new(Mutex::new(Vec::new()));
    hawser.set_free_userdata_func(handle, Some(recording_free(&freed)));
    hawser.set_userdata(handle, Some(9_u64));

    drop(hawser);
    assert!(eventually(|| ctl.close_count() == 1).await);
    assert_eq!(*freed.lock().unwrap(), vec![9]);
}

proptest::proptest! {
    #![proptest_config(proptest::prelude::ProptestConfig::with_cases(32))]

    #[test]
    fn random_retain_release_sequences_tear_down_exactly_once(
        ops in proptest::collection::vec(proptest::bool::ANY, 0..40)
    ) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let (backend, ctl) = hawser_mock::DynamicMockBackend::new_with_controller();
        let hawser = hawser::Hawser::builder()
            .backend(backend)
            .runtime(rt.handle().clone())
            .build()
            .unwrap();
        let (cb, rx) = capture();
        hawser.create(config(), cb, UserData::none());
        let handle = rx.blocking_recv().unwrap().handle.unwrap();

        // `true` retains, `false` releases; a release that would reach zero is skipped.
        let mut expected = 1usize;
        for retain in ops {
            if retain {
                hawser.retain(handle);
                expected += 1;
            } else if expected > 1 {
                hawser.release(handle);
                expected -= 1;
            }
            proptest::prop_assert_eq!(hawser.ref_count(handle), expected);
            proptest::prop_assert_eq!(ctl.close_count(), 0);
        }

        for _ in 0..expected {
            hawser.release(handle);
        }
        proptest::prop_assert_eq!(ctl.close_count(), 1);
        proptest::prop_assert_eq!(hawser.ref_count(handle), 0);
        proptest::prop_assert_eq!(hawser.live_handles(), 0);
    }
}
