// Multi-sensor tracking sample
//
// A unicycle driving a circle is tracked by a ring of range stations. Every
// step all stations measure the range to the vehicle and the measurements are
// fused by the multi-sensor sigma point update.

use nalgebra::{DMatrix, DVector, Vector2};
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::error::Error;

use sigma_fusion::filter::{BayesianFilter, MultiSensorGaussianFilter};
use sigma_fusion::models::factorized::FactorizedIidObservationModel;
use sigma_fusion::models::measurement::RangeObservationModel;
use sigma_fusion::models::motion::{ProcessModel, UnicycleProcessModel};
use sigma_fusion::quadrature::UnscentedQuadrature;
use sigma_fusion::utils::mvn::MultiVariateNormal;
use sigma_fusion::utils::plot::ellipse_series;
use sigma_fusion::utils::state::GaussianState;

const STATIONS: usize = 8;
const STATION_RADIUS: f64 = 20.0;

#[derive(Debug, Serialize)]
struct Record {
    time: f64,
    x_true: f64,
    y_true: f64,
    x_est: f64,
    y_est: f64,
    var_x: f64,
    var_y: f64,
}

#[derive(Default)]
struct History {
    x_true: Vec<(f64, f64)>,
    x_est: Vec<(f64, f64)>,
    gaussian_state: Vec<GaussianState<f64>>,
    records: Vec<Record>,
}

fn stations() -> Vec<Vector2<f64>> {
    (0..STATIONS)
        .map(|i| i as f64 / STATIONS as f64 * std::f64::consts::TAU)
        .map(|a| Vector2::new(STATION_RADIUS * a.cos(), 10.0 + STATION_RADIUS * a.sin()))
        .collect()
}

fn run() -> Result<History, Box<dyn Error>> {
    let sim_time = 50.0;
    let dt = 0.1;
    let mut time = 0.;

    // state : [x, y, yaw, v]
    let q = DMatrix::from_diagonal(&DVector::from_vec(vec![
        0.01,
        0.01,
        1.0_f64.to_radians().powi(2),
        0.05,
    ]));
    let r = DMatrix::from_element(1, 1, 0.25);

    let observation_model = FactorizedIidObservationModel::with_shared_state(
        RangeObservationModel::new(stations(), 4),
        STATIONS,
    )?;
    let mut filter = MultiSensorGaussianFilter::new(
        GaussianState::zero_mean(q.clone())?,
        GaussianState::zero_mean(r.clone())?,
        Box::new(UnicycleProcessModel),
        observation_model,
        UnscentedQuadrature::default(),
        GaussianState::new(DVector::from_vec(vec![1., -1., 0., 0.]), DMatrix::identity(4, 4))?,
    )?;

    let mut rng = StdRng::seed_from_u64(7);
    let process_noise = MultiVariateNormal::new(&DVector::zeros(4), &q)?;
    let range_noise = MultiVariateNormal::new(&DVector::zeros(1), &r)?;

    let u = DVector::from_vec(vec![1.0, 0.1]);
    let mut x_true = DVector::from_vec(vec![0., 0., 0., 0.]);
    let mut history = History::default();

    while time < sim_time {
        time += dt;
        x_true = UnicycleProcessModel.prediction(&x_true, &process_noise.sample(&mut rng), &u, dt);
        let noise = DVector::from_iterator(
            STATIONS,
            (0..STATIONS).map(|_| range_noise.sample(&mut rng)[0]),
        );
        let z = filter
            .observation_model()
            .predict_observation(&x_true, &DVector::zeros(STATIONS))?
            + noise;
        filter.update_estimate(&u, &z, dt)?;

        // record step
        let estimate = filter.gaussian_estimate();
        history.x_true.push((x_true[0], x_true[1]));
        history.x_est.push((estimate.x[0], estimate.x[1]));
        history.gaussian_state.push(estimate.clone());
        history.records.push(Record {
            time,
            x_true: x_true[0],
            y_true: x_true[1],
            x_est: estimate.x[0],
            y_est: estimate.x[1],
            var_x: estimate.cov[(0, 0)],
            var_y: estimate.cov[(1, 1)],
        });
    }
    log::info!(
        "{} steps fused with {} stations",
        history.records.len(),
        STATIONS
    );
    Ok(history)
}

fn chart(
    root: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
    history: &History,
    caption: &str,
) -> Result<(), Box<dyn Error>> {
    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(caption, ("sans-serif", 40))
        .x_label_area_size(30)
        .y_label_area_size(30)
        .build_cartesian_2d(-25.0..25.0, -15.0..35.0)?;

    chart.configure_mesh().x_desc("x").y_desc("y").draw()?;

    chart
        .draw_series(
            stations()
                .into_iter()
                .map(|s| TriangleMarker::new((s.x, s.y), 8, RED.filled())),
        )?
        .label("Stations")
        .legend(|(x, y)| TriangleMarker::new((x, y), 8, RED.filled()));

    chart
        .draw_series(LineSeries::new(history.x_true.clone(), &BLUE))?
        .label("True")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(history.x_est.clone(), &GREEN))?
        .label("Estimate")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));

    // 3 sigma ellipses every 5 s
    for state in history.gaussian_state.iter().step_by(50) {
        chart.draw_series(LineSeries::new(ellipse_series(state, (0, 1), 3.0)?, &BLACK))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // get data
    let history = run()?;

    // Create output directory if it didnt exist
    std::fs::create_dir_all("./img")?;

    let mut writer = csv::Writer::from_path("./img/multi_sensor_tracking.csv")?;
    for record in &history.records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    println!("Result has been saved to {}", "./img/multi_sensor_tracking.csv");

    let root = BitMapBackend::new("./img/multi_sensor_tracking.png", (1024, 1024)).into_drawing_area();
    root.fill(&WHITE)?;
    chart(&root, &history, "Multi-Sensor Gaussian Filter")?;
    // To avoid the IO failure being ignored silently, we manually call the present function
    root.present()?;
    println!("Result has been saved to {}", "./img/multi_sensor_tracking.png");

    Ok(())
}
