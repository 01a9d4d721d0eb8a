//! # Arm Control Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use arm_if::{
    eqpt::scene::{JointId, Scene},
    tc::arm_ctrl::{AxisInput, ManualInputs},
};
use arm_lib::{
    arm_ctrl::{ArmCtrl, InputData, Params, SeekTarget},
    sim::{self, SimScene},
};
use nalgebra::Vector3;
use util::module::State;

fn arm_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build the scene and controller ----

    let mut scene = SimScene::new(
        util::params::from_toml_str::<sim::Params>(include_str!("../../params/sim.toml")).unwrap(),
    )
    .unwrap();

    let mut arm_ctrl = ArmCtrl::new(
        util::params::from_toml_str::<Params>(include_str!("../../params/arm_ctrl.toml")).unwrap(),
    );
    arm_ctrl.sync_joints(&scene);

    // Sweep the base back and forth, the manual path runs the full collision check every tick
    let increase = InputData {
        dt_s: 0.02,
        inputs: ManualInputs::default().with_axis(
            JointId::Base,
            AxisInput {
                decrease: false,
                increase: true,
            },
        ),
    };

    c.bench_function("ArmCtrl::proc::manual", |b| {
        b.iter(|| {
            arm_ctrl
                .proc(&increase, &mut scene as &mut dyn Scene)
                .unwrap()
        })
    });

    // Seek towards a point behind the pillar, restarting whenever the seek ends
    let idle = InputData {
        dt_s: 0.02,
        ..Default::default()
    };
    let target = Vector3::new(-2.0, 0.5, 0.0);

    c.bench_function("ArmCtrl::proc::seek", |b| {
        b.iter(|| {
            if !arm_ctrl.is_busy() {
                arm_ctrl
                    .move_to_target(SeekTarget::Point(target))
                    .unwrap();
            }
            arm_ctrl.proc(&idle, &mut scene as &mut dyn Scene).unwrap()
        })
    });
}

criterion_group!(benches, arm_ctrl_benchmark);
criterion_main!(benches);
