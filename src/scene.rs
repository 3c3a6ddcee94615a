//! Minimal host scene: named objects referencing shared mesh data.
//!
//! Several objects may use the same mesh. A mesh no object references any more can be
//! removed with [`Scene::remove_mesh_if_unused`].

use crate::mesh::Mesh;

/// Handle to a mesh stored in a [`Scene`]. Stays valid until that mesh is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(usize);

/// Handle to an object stored in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    /// Objects without mesh data (empties, lights...) are never unwrap targets
    pub mesh: Option<MeshId>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    meshes: Vec<Option<Mesh>>,
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(Some(mesh));
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_object(&mut self, name: impl Into<String>, mesh: Option<MeshId>) -> ObjectId {
        self.objects.push(SceneObject {
            name: name.into(),
            mesh,
        });
        ObjectId(self.objects.len() - 1)
    }

    /// Add `mesh` and an object of the same name using it
    pub fn add_mesh_object(&mut self, mesh: Mesh) -> ObjectId {
        let name = mesh.name.clone();
        let id = self.add_mesh(mesh);
        self.add_object(name, Some(id))
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0).and_then(Option::as_ref)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.0)
    }

    /// Mesh data of object `id`, if it has any
    pub fn object_mesh(&self, id: ObjectId) -> Option<&Mesh> {
        self.object(id)?.mesh.and_then(|mesh| self.mesh(mesh))
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }

    /// Every live mesh
    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes
            .iter()
            .enumerate()
            .filter_map(|(i, mesh)| mesh.as_ref().map(|mesh| (MeshId(i), mesh)))
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.iter().flatten().count()
    }

    /// Number of objects using mesh `id`
    pub fn users(&self, id: MeshId) -> usize {
        self.objects.iter().filter(|o| o.mesh == Some(id)).count()
    }

    /// Remove mesh `id` if no object uses it. Returns whether it was removed.
    pub fn remove_mesh_if_unused(&mut self, id: MeshId) -> bool {
        if self.users(id) > 0 {
            return false;
        }
        self.meshes
            .get_mut(id.0)
            .and_then(Option::take)
            .is_some()
    }
}
