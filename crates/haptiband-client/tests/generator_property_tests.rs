//! 序列生成器的属性测试
//!
//! 使用 proptest 验证长度、结尾状态和每个阶段的等待分布。

use haptiband_client::{Pattern, TWO_BUZZ_GAP, generate};
use haptiband_protocol::{MotorChannel, MotorState};
use proptest::prelude::*;
use std::time::Duration;

fn motor_subset() -> impl Strategy<Value = Vec<MotorChannel>> {
    proptest::sample::subsequence(MotorChannel::CANONICAL.to_vec(), 1..=4).prop_shuffle()
}

proptest! {
    /// n 个电机：单次振动 2n 步，两次振动 4n 步
    #[test]
    fn sequence_length(motors in motor_subset(), buzz_ms in 0u64..1000, two_buzz in any::<bool>()) {
        let pattern = Pattern::new("p", &motors, Duration::from_millis(buzz_ms), two_buzz);
        let sequence = generate(&pattern).unwrap();
        let n = motors.len();
        prop_assert_eq!(sequence.len(), if two_buzz { 4 * n } else { 2 * n });
    }

    /// 最后 n 步把每个电机都关闭，且最后一步等待为 0
    #[test]
    fn sequence_ends_with_all_off(motors in motor_subset(), two_buzz in any::<bool>()) {
        let pattern = Pattern::new("p", &motors, Duration::from_millis(100), two_buzz);
        let sequence = generate(&pattern).unwrap();
        let n = motors.len();

        let tail = &sequence.steps()[sequence.len() - n..];
        for step in tail {
            prop_assert_eq!(step.command.state(), Some(MotorState::Off));
        }
        let mut off: Vec<MotorChannel> = tail.iter().filter_map(|s| s.command.motor()).collect();
        off.sort();
        let mut expected = motors.clone();
        expected.sort();
        prop_assert_eq!(off, expected);
        prop_assert_eq!(sequence.steps().last().unwrap().settle_delay, Duration::ZERO);
    }

    /// 总等待 = 振动次数 × buzz_length（+ 两次振动时的 50ms 间隔）
    #[test]
    fn total_delay(motors in motor_subset(), buzz_ms in 0u64..1000, two_buzz in any::<bool>()) {
        let buzz = Duration::from_millis(buzz_ms);
        let sequence = generate(&Pattern::new("p", &motors, buzz, two_buzz)).unwrap();
        let expected = if two_buzz { buzz * 2 + TWO_BUZZ_GAP } else { buzz };
        prop_assert_eq!(sequence.total_delay(), expected);
    }

    /// 每个阶段内电机按规范顺序出现
    #[test]
    fn phases_follow_canonical_order(motors in motor_subset()) {
        let sequence = generate(&Pattern::new("p", &motors, Duration::from_millis(10), true)).unwrap();
        let canonical = MotorChannel::canonicalize(&motors);
        for phase in sequence.steps().chunks(canonical.len()) {
            let order: Vec<MotorChannel> = phase.iter().filter_map(|s| s.command.motor()).collect();
            prop_assert_eq!(&order, &canonical);
        }
    }

    /// 任意时长（含亚毫秒部分）保存再加载后生成的序列不变
    #[test]
    fn record_round_trip_keeps_sequence(
        motors in motor_subset(),
        micros in 0u64..10_000_000,
        two_buzz in any::<bool>(),
    ) {
        let pattern = Pattern::new("p", &motors, Duration::from_micros(micros), two_buzz);
        let reloaded = Pattern::try_from(&pattern.to_record()).unwrap();
        prop_assert_eq!(&reloaded, &pattern);
        prop_assert_eq!(generate(&reloaded).unwrap(), generate(&pattern).unwrap());
    }
}
