use crate::cli::InfoArgs;
use crate::error::Result;
use mbnn::core::params::ModelParameters;
use mbnn::engine::error::EvalError;
use mbnn::engine::model::Model;
use std::io::Write;
use tracing::info;

pub fn run(args: InfoArgs) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    describe(&args, &mut stdout)
}

fn describe(args: &InfoArgs, out: &mut impl Write) -> Result<()> {
    info!("Loading model from {:?}", &args.model);
    let params = ModelParameters::<f64>::load(&args.model).map_err(EvalError::from)?;
    let model = Model::new(params, None)?;
    let topology = model.topology();

    writeln!(out, "Model: {}", args.model.display())?;
    writeln!(
        out,
        "Topology: {} ({} molecules, {} atoms)",
        topology.kind(),
        topology.molecule_count(),
        topology.atom_count()
    )?;
    writeln!(out, "Atom order: {}", topology.labels().join(" "))?;
    writeln!(out, "Energy unit: {}", model.energy_unit())?;

    let switch = model.switching().params();
    writeln!(
        out,
        "Switch: {} over [{}, {}] A, combination {:?}",
        switch.shape, switch.inner, switch.outer, switch.combination
    )?;

    writeln!(out, "Species:")?;
    for (type_index, label) in topology.registry().iter() {
        let descriptor = &model.descriptors().species()[type_index];
        let network = &model.networks()[type_index];
        let widths: Vec<String> = std::iter::once(network.input_dim())
            .chain(network.layers().iter().map(|layer| layer.output_dim()))
            .map(|w| w.to_string())
            .collect();
        writeln!(
            out,
            "  {:<2} type {}: {} features ({} radial, {} angular), network {} ({} parameters)",
            label,
            type_index,
            descriptor.dimension(),
            descriptor.radial.len(),
            descriptor.angular.len(),
            widths.join("-"),
            network.parameter_count()
        )?;
    }
    Ok(())
}
