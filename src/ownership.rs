use crate::error::{Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};

pub fn owner_reference<R>(owner: &R) -> std::result::Result<OwnerReference, String>
where
    R: Resource<DynamicType = ()>,
{
    let name = owner
        .meta()
        .name
        .clone()
        .ok_or_else(|| "owner has no name".to_string())?;
    let uid = owner
        .uid()
        .ok_or_else(|| format!("owner {} has no uid", name))?;

    Ok(OwnerReference {
        api_version: R::api_version(&()).to_string(),
        kind: R::kind(&()).to_string(),
        name,
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

pub fn set_controller_reference<R, C>(owner: &R, child: &mut C) -> Result<()>
where
    R: Resource<DynamicType = ()>,
    C: Resource<DynamicType = ()>,
{
    let child_name = format!("{} {}", C::kind(&()), child.name_any());

    let reference = owner_reference(owner).map_err(|reason| Error::OwnerReference {
        child: child_name.clone(),
        reason,
    })?;

    let references = child.meta_mut().owner_references.get_or_insert_with(Vec::new);
    if let Some(existing) = references
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != reference.uid)
    {
        return Err(Error::OwnerReference {
            child: child_name,
            reason: format!(
                "already controlled by {} {}",
                existing.kind, existing.name
            ),
        });
    }

    references.retain(|r| r.uid != reference.uid);
    references.push(reference);
    Ok(())
}

pub fn is_controlled_by<R, C>(owner: &R, child: &C) -> bool
where
    R: Resource<DynamicType = ()>,
    C: Resource,
{
    let Some(uid) = owner.meta().uid.as_deref() else {
        return false;
    };
    child
        .meta()
        .owner_references
        .iter()
        .flatten()
        .any(|r| r.controller == Some(true) && r.uid == uid && r.kind == R::kind(&()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{MongoDB, MongoDBSpec};
    use k8s_openapi::api::core::v1::Service;
    use kube::api::ObjectMeta;

    fn persisted_parent() -> MongoDB {
        let mut db = MongoDB::new("db1", MongoDBSpec::default());
        db.metadata.namespace = Some("ns".into());
        db.metadata.uid = Some("1234".into());
        db
    }

    fn child() -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some("db1-mongodb-service".into()),
                namespace: Some("ns".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn reference_names_the_parent() {
        let reference = owner_reference(&persisted_parent()).unwrap();
        assert_eq!(reference.api_version, "databases.example.com/v1alpha1");
        assert_eq!(reference.kind, "MongoDB");
        assert_eq!(reference.name, "db1");
        assert_eq!(reference.uid, "1234");
        assert_eq!(reference.controller, Some(true));
        assert_eq!(reference.block_owner_deletion, Some(true));
    }

    #[test]
    fn parent_without_uid_cannot_own() {
        let mut parent = persisted_parent();
        parent.metadata.uid = None;
        let mut svc = child();

        let err = set_controller_reference(&parent, &mut svc).unwrap_err();
        assert!(matches!(err, Error::OwnerReference { .. }));
        assert!(svc.metadata.owner_references.is_none());
    }

    #[test]
    fn stamping_is_idempotent() {
        let parent = persisted_parent();
        let mut svc = child();
        set_controller_reference(&parent, &mut svc).unwrap();
        set_controller_reference(&parent, &mut svc).unwrap();

        assert_eq!(svc.metadata.owner_references.as_ref().unwrap().len(), 1);
        assert!(is_controlled_by(&parent, &svc));
    }

    #[test]
    fn second_controller_is_rejected() {
        let parent = persisted_parent();
        let mut other = persisted_parent();
        other.metadata.name = Some("db2".into());
        other.metadata.uid = Some("5678".into());

        let mut svc = child();
        set_controller_reference(&other, &mut svc).unwrap();
        assert!(set_controller_reference(&parent, &mut svc).is_err());
        assert!(!is_controlled_by(&parent, &svc));
    }
}
