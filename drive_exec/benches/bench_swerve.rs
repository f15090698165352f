//! # Swerve Kinematics Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use drive_lib::drive_ctrl::{desaturate, ChassisSpeeds, SwerveKinematics};

fn swerve_benchmark(c: &mut Criterion) {
    // ---- Build kinematics for a square chassis ----

    let kin = SwerveKinematics::new(0.635, 0.635).unwrap();

    // Combined translation and rotation demand, fast enough to require
    // desaturation
    let speeds = ChassisSpeeds {
        vx_ms: 3.0,
        vy_ms: -1.5,
        omega_rads: 4.0,
    };

    let prev_angles_rad = [0.0; 4];

    c.bench_function("SwerveKinematics::inverse", |b| {
        b.iter(|| kin.inverse(black_box(&speeds), black_box(&prev_angles_rad)))
    });

    c.bench_function("SwerveKinematics::inverse+desaturate", |b| {
        b.iter(|| {
            let mut states = kin.inverse(black_box(&speeds), &prev_angles_rad);
            desaturate(&mut states, 4.47);
            states
        })
    });

    let states = kin.inverse(&speeds, &prev_angles_rad);

    c.bench_function("SwerveKinematics::forward", |b| {
        b.iter(|| kin.forward(black_box(&states)))
    });
}

criterion_group!(benches, swerve_benchmark);
criterion_main!(benches);
