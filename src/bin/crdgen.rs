use kube::CustomResourceExt;
use mongodb_operator::MongoDB;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&MongoDB::crd())?);
    Ok(())
}
